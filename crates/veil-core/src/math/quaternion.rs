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

//! Provides a quaternion type for head, hand and body rotations.

use serde::{Deserialize, Serialize};

use super::{Vec3, EPSILON};
use std::ops::{Mul, MulAssign};

/// A rotation stored as `(x, y, z, w)`, where `[x, y, z]` is the vector part
/// and `w` the scalar part.
///
/// Rotations should be unit quaternions. Constructors in this module always
/// return normalized values; [`Quat::new`] does not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Quat {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar (real) part.
    pub w: f32,
}

impl Quat {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a new quaternion from its raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a rotation of `angle_radians` around `axis`.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let axis = axis.normalize_or_zero();
        if axis.is_zero() {
            return Self::IDENTITY;
        }
        let (s, c) = (angle_radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Creates a rotation around the world up axis.
    #[inline]
    pub fn from_yaw(yaw_radians: f32) -> Self {
        Self::from_axis_angle(Vec3::Y, yaw_radians)
    }

    /// Extracts the heading (rotation around the world up axis) of this rotation.
    pub fn yaw(&self) -> f32 {
        let q = self.normalize();
        (2.0 * (q.x * q.z + q.w * q.y)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y))
    }

    /// Returns the pure-heading part of this rotation, discarding pitch and roll.
    #[inline]
    pub fn yaw_only(&self) -> Self {
        Self::from_yaw(self.yaw())
    }

    /// Calculates the squared length of the quaternion.
    #[inline]
    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Returns a normalized copy, or the identity for a near-zero quaternion.
    pub fn normalize(&self) -> Self {
        let mag_sq = self.magnitude_squared();
        if mag_sq > EPSILON {
            let inv = 1.0 / mag_sq.sqrt();
            Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
        } else {
            Self::IDENTITY
        }
    }

    /// Negates the vector part. For a unit quaternion this is the inverse rotation.
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a 3D vector by this quaternion.
    pub fn rotate_vec3(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let s = self.w;
        2.0 * u.dot(v) * u + (s * s - u.dot(u)) * v + 2.0 * s * u.cross(v)
    }
}

impl Default for Quat {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quat> for Quat {
    type Output = Self;
    /// Combines two rotations using the Hamilton product (`rhs` is applied first).
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl MulAssign<Quat> for Quat {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;
    /// Rotates a `Vec3` by this quaternion.
    #[inline]
    fn mul(self, rhs: Vec3) -> Self::Output {
        self.normalize().rotate_vec3(rhs)
    }
}

impl approx::AbsDiffEq for Quat {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    /// Two quaternions are equal when they describe the same rotation (`q` and `-q` included).
    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        let same = |sign: f32| {
            self.x.abs_diff_eq(&(other.x * sign), epsilon)
                && self.y.abs_diff_eq(&(other.y * sign), epsilon)
                && self.z.abs_diff_eq(&(other.z * sign), epsilon)
                && self.w.abs_diff_eq(&(other.w * sign), epsilon)
        };
        same(1.0) || same(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{FRAC_PI_2, PI};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identity_and_default() {
        assert_eq!(Quat::default(), Quat::IDENTITY);
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_abs_diff_eq!(Quat::IDENTITY * v, v, epsilon = 1e-6);
    }

    #[test]
    fn test_from_yaw_rotates_forward() {
        // Yawing +90 degrees around Y turns -Z (forward) into -X.
        let q = Quat::from_yaw(FRAC_PI_2);
        let forward = Vec3::new(0.0, 0.0, -1.0);
        assert_abs_diff_eq!(q * forward, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_yaw_extraction_round_trip() {
        for angle in [-3.0, -1.2, 0.0, 0.4, 2.9] {
            assert_abs_diff_eq!(Quat::from_yaw(angle).yaw(), angle, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_yaw_only_discards_pitch() {
        let pitch = Quat::from_axis_angle(Vec3::X, 0.5);
        let q = Quat::from_yaw(1.0) * pitch;
        assert_abs_diff_eq!(q.yaw_only(), Quat::from_yaw(1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_composition_and_conjugate() {
        let a = Quat::from_yaw(0.3);
        let b = Quat::from_yaw(0.4);
        assert_abs_diff_eq!(a * b, Quat::from_yaw(0.7), epsilon = 1e-6);
        assert_abs_diff_eq!(a * a.conjugate(), Quat::IDENTITY, epsilon = 1e-6);
    }

    #[test]
    fn test_double_cover_equality() {
        let q = Quat::from_yaw(PI / 3.0);
        let neg = Quat::new(-q.x, -q.y, -q.z, -q.w);
        assert_abs_diff_eq!(q, neg, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_axis_is_identity() {
        assert_eq!(Quat::from_axis_angle(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }
}
