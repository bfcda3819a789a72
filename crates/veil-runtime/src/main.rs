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

//! Opens a window and runs the engine on the demo level.
//!
//! Usage: `veil-runtime [config.ron]`, or `veil-runtime --print-config` to
//! dump the default configuration.

mod demo;

use std::path::Path;

use anyhow::{Context, Result};
use veil_sdk::{run_windowed, Engine, EngineConfig};

use crate::demo::{CameraLog, DemoLevel};

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let Some(path) = path else {
        log::info!("No config given, using defaults.");
        return Ok(EngineConfig::default());
    };
    if !Path::new(path).exists() {
        log::warn!("Config file {path} not found, using defaults.");
        return Ok(EngineConfig::default());
    }
    EngineConfig::load(path).with_context(|| format!("reading {path}"))
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("winit", log::LevelFilter::Warn)
        .init();

    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--print-config") {
        let config = EngineConfig::default();
        println!("{}", config.to_ron_string()?);
        log::debug!("JSON form:\n{}", config.to_json_pretty()?);
        return Ok(());
    }

    let config = load_config(arg.as_deref())?;
    let mut engine = Engine::new(config)?;
    engine.levels_mut().add_level(Box::new(DemoLevel::default()));
    engine.levels_mut().jump_to_first()?;
    engine.set_frame_sink(Box::new(CameraLog));

    log::info!("Veil runtime starting on {:?}.", engine.backend());
    run_windowed(engine)
}
