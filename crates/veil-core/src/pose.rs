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

//! # Pose and Timing Contract
//!
//! Every VR backend, and the windowed fallback, produces the same thing once per
//! frame: a head pose in tracking space plus the real time elapsed since the
//! previous frame. The engine converts that local pose into gameplay space
//! through the [`CameraRig`] the player body exposes.

use serde::{Deserialize, Serialize};

use crate::error::InitializationError;
use crate::math::{Quat, Vec3};

/// The VR runtime a pose source talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VrBackend {
    /// Oculus runtime.
    Oculus,
    /// OpenVR / SteamVR runtime.
    OpenVr,
    /// OpenHMD runtime.
    OpenHmd,
    /// Windowed mode without a headset; the head follows the body.
    #[default]
    NoVr,
    /// Scripted headset, used headless and in tests.
    Simulated,
}

/// A position and an orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Position in meters.
    pub position: Vec3,
    /// Orientation.
    pub orientation: Quat,
}

impl Pose {
    /// The origin, facing `-Z`.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Creates a new pose.
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// Which hand a tracked controller is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandSide {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

/// Snapshot of a tracked hand controller for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandControllerState {
    /// Hand the controller belongs to.
    pub side: HandSide,
    /// Pose in gameplay space.
    pub pose: Pose,
    /// Linear velocity in meters per second.
    pub linear_velocity: Vec3,
    /// Angular velocity in radians per second.
    pub angular_velocity: Vec3,
    /// Analog axes (thumbsticks, triggers) in `[-1, 1]`.
    pub axes: Vec<f32>,
    /// Digital button states.
    pub buttons: Vec<bool>,
}

impl HandControllerState {
    /// Creates an idle controller at `pose` with the given number of axes and buttons.
    pub fn idle(side: HandSide, pose: Pose, axis_count: usize, button_count: usize) -> Self {
        Self {
            side,
            pose,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            axes: vec![0.0; axis_count],
            buttons: vec![false; button_count],
        }
    }
}

/// Everything a pose source reports for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSample {
    /// Head pose in tracking-local space.
    pub head: Pose,
    /// Real time elapsed since the previous sample, in seconds.
    pub delta_time: f64,
    /// Monotonically increasing frame counter of the source.
    pub frame: u64,
    /// Tracked hand controllers, already in gameplay space.
    pub hands: Vec<HandControllerState>,
}

/// The gameplay-space frame the tracking space is attached to.
///
/// `feet` and `orientation` come from the player body; `eye_height` is used by
/// sources that have no real head tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Feet position (room base in room-scale mode).
    pub feet: Vec3,
    /// Body orientation.
    pub orientation: Quat,
    /// Height of the eyes above the feet.
    pub eye_height: f32,
}

impl CameraRig {
    /// Transforms a tracking-local pose into gameplay space.
    pub fn to_world(&self, local: &Pose) -> Pose {
        Pose {
            position: self.feet + self.orientation * local.position,
            orientation: self.orientation * local.orientation,
        }
    }
}

/// A source of head poses and frame timing.
///
/// Implementations must not touch gameplay state. The engine calls
/// [`PoseSource::acquire`] exactly once per frame, before anything else.
pub trait PoseSource {
    /// The runtime this source talks to.
    fn backend(&self) -> VrBackend;

    /// Produces this frame's head pose and elapsed time.
    ///
    /// An unrecoverable device or session failure must be reported as an
    /// [`InitializationError`], never as a zeroed pose.
    fn acquire(&mut self, rig: &CameraRig) -> Result<TrackingSample, InitializationError>;

    /// Re-zeros the forward-facing direction of tracking space.
    ///
    /// Must not move the gameplay position.
    fn recenter(&mut self);

    /// Number of samples produced so far.
    fn frame_count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rig_to_world_applies_body_yaw() {
        let rig = CameraRig {
            feet: Vec3::new(1.0, 0.0, 2.0),
            orientation: Quat::from_yaw(FRAC_PI_2),
            eye_height: 1.6,
        };
        let local = Pose::new(Vec3::new(0.0, 1.6, -1.0), Quat::IDENTITY);
        let world = rig.to_world(&local);
        assert_abs_diff_eq!(world.position, Vec3::new(0.0, 1.6, 2.0), epsilon = 1e-5);
        assert_abs_diff_eq!(world.orientation, rig.orientation, epsilon = 1e-6);
    }

    #[test]
    fn test_backend_defaults_to_novr() {
        assert_eq!(VrBackend::default(), VrBackend::NoVr);
    }
}
