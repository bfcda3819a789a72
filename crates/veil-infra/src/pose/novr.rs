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

use veil_core::error::InitializationError;
use veil_core::math::{Quat, Vec3};
use veil_core::pose::{CameraRig, Pose, PoseSource, TrackingSample, VrBackend};
use veil_core::Stopwatch;

/// Windowed mode without a headset.
///
/// The head sits `eye_height` above the feet and looks where the body looks.
/// Timing comes from the wall clock.
#[derive(Debug, Default)]
pub struct NoVrPoseSource {
    stopwatch: Stopwatch,
    frame: u64,
}

impl NoVrPoseSource {
    /// Creates the source; the first delta is measured from now.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoseSource for NoVrPoseSource {
    fn backend(&self) -> VrBackend {
        VrBackend::NoVr
    }

    fn acquire(&mut self, rig: &CameraRig) -> Result<TrackingSample, InitializationError> {
        self.frame += 1;
        Ok(TrackingSample {
            head: Pose::new(Vec3::new(0.0, rig.eye_height, 0.0), Quat::IDENTITY),
            delta_time: self.stopwatch.lap().as_secs_f64(),
            frame: self.frame,
            hands: Vec::new(),
        })
    }

    fn recenter(&mut self) {}

    fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_head_at_eye_height_above_feet() {
        let mut source = NoVrPoseSource::new();
        let rig = CameraRig {
            feet: Vec3::new(1.0, 0.0, 10.0),
            orientation: Quat::from_yaw(0.7),
            eye_height: 1.59,
        };
        let sample = source.acquire(&rig).expect("NoVR never fails");
        let world = rig.to_world(&sample.head);
        assert_abs_diff_eq!(world.position, Vec3::new(1.0, 1.59, 10.0), epsilon = 1e-5);
        assert_abs_diff_eq!(world.orientation, rig.orientation, epsilon = 1e-6);
        assert!(sample.delta_time >= 0.0);
    }

    #[test]
    fn test_frame_counter_increases() {
        let mut source = NoVrPoseSource::new();
        let rig = CameraRig {
            feet: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            eye_height: 1.0,
        };
        let first = source.acquire(&rig).expect("sample").frame;
        let second = source.acquire(&rig).expect("sample").frame;
        assert!(second > first);
        assert_eq!(source.frame_count(), 2);
    }
}
