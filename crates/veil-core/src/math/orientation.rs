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

//! Euler-style body orientation used by gameplay code.

use serde::{Deserialize, Serialize};

use super::{Quat, Vec3};

/// Body orientation as yaw (around Y), pitch (around X) and roll (around Z).
///
/// The rotation order is yaw, then pitch, then roll, so yawing always turns
/// around the world up axis regardless of pitch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyOrientation {
    /// Heading in radians.
    pub yaw: f32,
    /// Pitch in radians.
    pub pitch: f32,
    /// Roll in radians.
    pub roll: f32,
}

impl BodyOrientation {
    /// An orientation facing `-Z` with no pitch or roll.
    pub const IDENTITY: Self = Self {
        yaw: 0.0,
        pitch: 0.0,
        roll: 0.0,
    };

    /// Creates an orientation with only a heading.
    #[inline]
    pub const fn from_yaw(yaw: f32) -> Self {
        Self {
            yaw,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    /// Converts to a quaternion.
    pub fn to_quat(&self) -> Quat {
        Quat::from_yaw(self.yaw)
            * Quat::from_axis_angle(Vec3::X, self.pitch)
            * Quat::from_axis_angle(Vec3::Z, self.roll)
    }

    /// Decomposes a quaternion into yaw, pitch and roll.
    pub fn from_quat(q: Quat) -> Self {
        let q = q.normalize();
        let sin_pitch = (2.0 * (q.w * q.x - q.y * q.z)).clamp(-1.0, 1.0);
        Self {
            yaw: q.yaw(),
            pitch: sin_pitch.asin(),
            roll: (2.0 * (q.x * q.y + q.w * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.z * q.z)),
        }
    }

    /// Turns the body around the world up axis.
    #[inline]
    pub fn add_yaw(&mut self, delta: f32) {
        self.yaw += delta;
    }
}

impl From<BodyOrientation> for Quat {
    fn from(value: BodyOrientation) -> Self {
        value.to_quat()
    }
}
