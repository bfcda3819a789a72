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

//! Conversions between engine math and Rapier's math types.

use rapier3d::prelude::{RigidBodyHandle as RapierBodyHandle, *};
use veil_core::math::{Quat, Vec3};
use veil_core::physics::{ColliderHandle, RigidBodyHandle};

pub fn to_rapier_vec(v: Vec3) -> Vector {
    Vector::new(v.x, v.y, v.z)
}

pub fn from_rapier_vec(x: Real, y: Real, z: Real) -> Vec3 {
    Vec3::new(x, y, z)
}

pub fn to_rapier_quat(q: Quat) -> Rotation {
    let q = q.normalize();
    Rotation::from_xyzw(q.x, q.y, q.z, q.w)
}

/// Rotation as a scaled axis (axis * angle), the form Rapier's builders take.
pub fn to_scaled_axis(q: Quat) -> Vector {
    let q = q.normalize();
    // Take the short way around so the angle stays in [0, PI].
    let q = if q.w < 0.0 {
        Quat::new(-q.x, -q.y, -q.z, -q.w)
    } else {
        q
    };
    let angle = 2.0 * q.w.clamp(-1.0, 1.0).acos();
    let sin_half = (1.0 - q.w * q.w).max(0.0).sqrt();
    if sin_half < 1e-6 {
        return Vector::new(0.0, 0.0, 0.0);
    }
    let k = angle / sin_half;
    Vector::new(q.x * k, q.y * k, q.z * k)
}

pub fn to_rapier_body(handle: RigidBodyHandle) -> RapierBodyHandle {
    let (index, generation) = handle.into_parts();
    RapierBodyHandle::from_raw_parts(index, generation)
}

pub fn from_rapier_body(handle: RapierBodyHandle) -> RigidBodyHandle {
    let (index, generation) = handle.into_raw_parts();
    RigidBodyHandle::from_parts(index, generation)
}

pub fn to_rapier_collider(handle: ColliderHandle) -> rapier3d::prelude::ColliderHandle {
    let (index, generation) = handle.into_parts();
    rapier3d::prelude::ColliderHandle::from_raw_parts(index, generation)
}

pub fn from_rapier_collider(handle: rapier3d::prelude::ColliderHandle) -> ColliderHandle {
    let (index, generation) = handle.into_raw_parts();
    ColliderHandle::from_parts(index, generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_scaled_axis_of_yaw() {
        let axis = to_scaled_axis(Quat::from_yaw(0.5));
        assert_abs_diff_eq!(axis.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(axis.y, 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(axis.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scaled_axis_of_identity_is_zero() {
        let axis = to_scaled_axis(Quat::IDENTITY);
        assert_eq!((axis.x, axis.y, axis.z), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_handle_round_trip_keeps_generation() {
        let handle = RigidBodyHandle::from_parts(3, 9);
        assert_eq!(from_rapier_body(to_rapier_body(handle)), handle);
    }
}
