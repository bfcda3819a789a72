// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Engine configuration.
//!
//! The configuration is a single RON document. Every field has a default, so a
//! file only needs to list what it changes:
//!
//! ```ron
//! (
//!     backend: Simulated,
//!     player: (eye_height: 1.75, mode: RoomScale),
//!     physics: (max_substeps: 4),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use veil_core::math::Vec3;
use veil_core::physics::PhysicsSettings;
use veil_core::pose::VrBackend;

use crate::player::PlayerMode;

/// Failure to read or parse a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid configuration.
    #[error("invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration could not be written out.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Empirical tuning constants of the player controls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Multiplier applied to the analog rotate intent before it becomes a yaw delta.
    pub analog_yaw_factor: f32,
    /// Multiplier applied to relative mouse motion before it becomes a yaw delta.
    pub mouse_sensitivity: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            analog_yaw_factor: -7.0,
            mouse_sensitivity: 3.0,
        }
    }
}

/// Physical parameters and starting state of the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Height of the eyes above the feet, in meters.
    pub eye_height: f32,
    /// Walking speed in meters per second.
    pub walk_speed: f32,
    /// Speed multiplier while running.
    pub run_factor: f32,
    /// Turn speed used by the analog and mouse rotation.
    pub turn_speed: f32,
    /// Mass of the player body in kg.
    pub mass: f32,
    /// Vertical speed given by a jump, in meters per second.
    pub jump_speed: f32,
    /// Initial feet position.
    pub start_position: Vec3,
    /// Initial heading in radians.
    pub start_yaw: f32,
    /// Locomotion mode.
    pub mode: PlayerMode,
    /// Keep the standing capsule upright every frame.
    pub standing_stabilization: bool,
    /// Control tuning.
    pub tuning: PlayerTuning,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            eye_height: 1.59,
            walk_speed: 3.0,
            run_factor: 3.0,
            turn_speed: 0.15,
            mass: 80.0,
            jump_speed: 4.0,
            start_position: Vec3::new(0.0, 0.0, 10.0),
            start_yaw: 0.0,
            mode: PlayerMode::Standing,
            standing_stabilization: true,
            tuning: PlayerTuning::default(),
        }
    }
}

/// Input handling settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Analog values below this magnitude are read as zero by the default listener.
    pub stick_deadzone: f32,
    /// Overrides [`PlayerTuning::mouse_sensitivity`] when set.
    pub mouse_sensitivity: Option<f32>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            stick_deadzone: 0.15,
            mouse_sensitivity: None,
        }
    }
}

/// Everything the engine needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// VR runtime to open.
    pub backend: VrBackend,
    /// Fall back to the windowed NoVR source when `backend` cannot be opened.
    pub fallback_to_novr: bool,
    /// Lock the player's physical parameters once the engine is built.
    pub lock_player_parameters: bool,
    /// Collect physics debug lines.
    pub debug_physics: bool,
    /// Title of the window opened by the windowed runner.
    pub window_title: String,
    /// Player settings.
    pub player: PlayerConfig,
    /// Physics stepping settings.
    pub physics: PhysicsSettings,
    /// Input settings.
    pub input: InputConfig,
    /// Frame time reported by the simulated headset, in seconds.
    pub simulated_frame_time: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: VrBackend::NoVr,
            fallback_to_novr: true,
            lock_player_parameters: true,
            debug_physics: false,
            window_title: "Veil".to_owned(),
            player: PlayerConfig::default(),
            physics: PhysicsSettings::default(),
            input: InputConfig::default(),
            simulated_frame_time: 1.0 / 90.0,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Loaded engine config from {}.", path.display());
        Ok(config)
    }

    /// Renders the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Renders the configuration as pretty JSON, for debug dumps.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// The tuning the player body runs with, input overrides applied.
    pub fn effective_tuning(&self) -> PlayerTuning {
        PlayerTuning {
            mouse_sensitivity: self
                .input
                .mouse_sensitivity
                .unwrap_or(self.player.tuning.mouse_sensitivity),
            ..self.player.tuning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_ron_str("()").expect("empty config should parse");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.player.tuning.analog_yaw_factor, -7.0);
        assert_eq!(config.input.stick_deadzone, 0.15);
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = EngineConfig::from_ron_str(
            "(backend: Simulated, player: (eye_height: 1.75, mode: RoomScale), physics: (max_substeps: 4))",
        )
        .expect("config should parse");
        assert_eq!(config.backend, VrBackend::Simulated);
        assert_eq!(config.player.eye_height, 1.75);
        assert_eq!(config.player.mode, PlayerMode::RoomScale);
        assert_eq!(config.player.mass, 80.0);
        assert_eq!(config.physics.max_substeps, 4);
        assert_eq!(config.physics.fixed_timestep, 1.0 / 240.0);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = EngineConfig::from_ron_str("(backend: Vulkan)").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_ron_output_parses_back() {
        let mut config = EngineConfig::default();
        config.window_title = "demo".into();
        config.input.mouse_sensitivity = Some(1.5);
        let text = config.to_ron_string().expect("config should serialize");
        assert_eq!(EngineConfig::from_ron_str(&text).expect("reparse"), config);
    }

    #[test]
    fn test_mouse_sensitivity_override() {
        let mut config = EngineConfig::default();
        assert_eq!(config.effective_tuning().mouse_sensitivity, 3.0);
        config.input.mouse_sensitivity = Some(0.5);
        let tuning = config.effective_tuning();
        assert_eq!(tuning.mouse_sensitivity, 0.5);
        assert_eq!(tuning.analog_yaw_factor, -7.0);
    }
}
