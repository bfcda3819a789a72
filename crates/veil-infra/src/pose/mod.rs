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

//! Pose and timing sources.
//!
//! The native VR runtimes are selected by configuration. This build links
//! none of them, so asking for one reports [`InitializationError::RuntimeUnavailable`]
//! and the application decides whether to fall back to [`NoVrPoseSource`].

mod novr;
mod simulated;

pub use self::novr::NoVrPoseSource;
pub use self::simulated::{HeadsetControl, SimulatedHeadset};

use veil_core::error::InitializationError;
use veil_core::pose::{PoseSource, VrBackend};

/// Opens the pose source for `backend`.
///
/// `frame_time` is the fixed delta reported by the simulated headset.
pub fn open_pose_source(
    backend: VrBackend,
    frame_time: f64,
) -> Result<Box<dyn PoseSource>, InitializationError> {
    match backend {
        VrBackend::Oculus | VrBackend::OpenVr | VrBackend::OpenHmd => {
            Err(InitializationError::RuntimeUnavailable {
                backend,
                reason: "no native runtime is linked into this build".to_owned(),
            })
        }
        VrBackend::NoVr => {
            log::info!("Using the windowed NoVR pose source.");
            Ok(Box::new(NoVrPoseSource::new()))
        }
        VrBackend::Simulated => {
            log::info!("Using a simulated headset at {frame_time:.4}s per frame.");
            Ok(Box::new(SimulatedHeadset::new(frame_time)))
        }
    }
}
