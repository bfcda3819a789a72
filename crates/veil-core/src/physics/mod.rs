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

//! # Physics Abstractions
//!
//! Universal traits and types for physics simulation providers.
//!
//! The provider owns its world exclusively. Anything else talks to it through
//! opaque handles and reads back what happened through [`PhysicsNotification`]s
//! pushed into a sink installed with [`PhysicsProvider::set_notification_sink`].

mod owner;

pub use self::owner::{BodyOwner, ObjectId, TriggerId};

use serde::{Deserialize, Serialize};

use crate::error::InitializationError;
use crate::math::{Quat, Vec3};

/// Opaque handle to a rigid body in the physics engine.
///
/// Packs the slot index in the low 32 bits and its generation in the high 32
/// bits, so a handle to a removed body never aliases a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RigidBodyHandle(pub u64);

/// Opaque handle to a collider in the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColliderHandle(pub u64);

macro_rules! packed_handle {
    ($name:ident) => {
        impl $name {
            /// Packs an index and a generation into a handle.
            #[inline]
            pub const fn from_parts(index: u32, generation: u32) -> Self {
                Self((index as u64) | ((generation as u64) << 32))
            }

            /// Splits the handle into `(index, generation)`.
            #[inline]
            pub const fn into_parts(self) -> (u32, u32) {
                (self.0 as u32, (self.0 >> 32) as u32)
            }
        }
    };
}

packed_handle!(RigidBodyHandle);
packed_handle!(ColliderHandle);

/// Defines the type of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Responds to forces and collisions.
    Dynamic,
    /// Fixed in place, does not move.
    Static,
    /// Controlled by the user, not by forces.
    Kinematic,
}

/// Description for creating a rigid body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyDesc {
    /// Initial position of the center of mass.
    pub position: Vec3,
    /// Initial rotation.
    pub rotation: Quat,
    /// Body type.
    pub body_type: BodyType,
    /// Linear velocity.
    pub linear_velocity: Vec3,
    /// Angular velocity.
    pub angular_velocity: Vec3,
    /// Mass of the body in kg (dynamic only).
    pub mass: f32,
    /// Whether the body may fall asleep when at rest.
    pub can_sleep: bool,
    /// What this body represents in the game, reported back in contacts.
    pub owner: BodyOwner,
}

impl RigidBodyDesc {
    /// A resting dynamic body of `mass` kg at `position`.
    pub fn dynamic(position: Vec3, mass: f32, owner: BodyOwner) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            body_type: BodyType::Dynamic,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            can_sleep: true,
            owner,
        }
    }

    /// A static body at `position`.
    pub fn fixed(position: Vec3, owner: BodyOwner) -> Self {
        Self {
            body_type: BodyType::Static,
            mass: 0.0,
            ..Self::dynamic(position, 0.0, owner)
        }
    }
}

/// Description for creating a collider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderDesc {
    /// Associated rigid body if any.
    pub parent_body: Option<RigidBodyHandle>,
    /// Relative position to parent/world.
    pub position: Vec3,
    /// Relative rotation to parent/world.
    pub rotation: Quat,
    /// Shape description.
    pub shape: ColliderShape,
    /// Density contributing to the parent's mass. Use `0.0` when the body mass is explicit.
    pub density: f32,
    /// Friction coefficient.
    pub friction: f32,
    /// Sensors detect overlap but never produce contact forces.
    pub sensor: bool,
    /// Owner reported for a collider without a parent body.
    pub owner: BodyOwner,
}

impl ColliderDesc {
    /// A solid collider attached to `parent` at its origin.
    pub fn attached(parent: RigidBodyHandle, shape: ColliderShape) -> Self {
        Self {
            parent_body: Some(parent),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            shape,
            density: 0.0,
            friction: 0.5,
            sensor: false,
            owner: BodyOwner::Untagged,
        }
    }

    /// A free-standing sensor volume at `position`.
    pub fn sensor(position: Vec3, shape: ColliderShape, owner: BodyOwner) -> Self {
        Self {
            parent_body: None,
            position,
            sensor: true,
            owner,
            ..Self::attached(RigidBodyHandle(0), shape)
        }
    }
}

/// Supported collider shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Box with half-extents.
    Box(Vec3),
    /// Sphere with radius.
    Sphere(f32),
    /// Upright capsule with half-height of the cylindrical part and radius.
    Capsule(f32, f32),
}

/// One colliding pair, reported once per physics step that had contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactReport {
    /// Owner of the first body.
    pub a: BodyOwner,
    /// Owner of the second body.
    pub b: BodyOwner,
    /// World-space contact point.
    pub position: Vec3,
    /// Contact normal on body `b`, pointing from `b` towards `a`.
    pub normal: Vec3,
}

/// A sensor volume started or stopped overlapping something.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerReport {
    /// The sensor volume.
    pub trigger: TriggerId,
    /// What entered or left it.
    pub other: BodyOwner,
    /// `true` on enter, `false` on leave.
    pub contact: bool,
}

/// What a physics provider reports after a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PhysicsNotification {
    /// Two solid bodies touch.
    Contact(ContactReport),
    /// A trigger transition.
    Trigger(TriggerReport),
}

/// A line segment of the physics debug overlay.
///
/// Laid out as six packed `f32`, so a slice of lines can be uploaded as a
/// vertex buffer of line-list positions.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct DebugLine {
    /// Start point.
    pub start: Vec3,
    /// End point.
    pub end: Vec3,
}

impl DebugLine {
    /// Raw bytes of `lines`, two positions per line.
    pub fn as_bytes(lines: &[DebugLine]) -> &[u8] {
        bytemuck::cast_slice(lines)
    }

    /// The lines as a flat list of positions.
    pub fn as_points(lines: &[DebugLine]) -> &[Vec3] {
        bytemuck::cast_slice(lines)
    }
}

/// Stepping configuration of a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Global gravity.
    pub gravity: Vec3,
    /// Maximum number of fixed substeps simulated per `step` call.
    pub max_substeps: u32,
    /// Duration of one fixed substep in seconds.
    pub fixed_timestep: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -10.0, 0.0),
            max_substeps: 10,
            fixed_timestep: 1.0 / 240.0,
        }
    }
}

impl PhysicsSettings {
    /// Checks that the world can be stepped with these settings.
    pub fn validate(&self) -> Result<(), InitializationError> {
        if !(self.fixed_timestep > 0.0 && self.fixed_timestep.is_finite()) {
            return Err(InitializationError::InvalidPhysicsSettings(format!(
                "fixed timestep must be a positive number of seconds, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(InitializationError::InvalidPhysicsSettings(
                "at least one substep per step is required".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Interface contract for any physics engine implementation (e.g., Rapier).
pub trait PhysicsProvider: Send + Sync {
    /// Advances the simulation by `dt` seconds using bounded fixed substeps.
    ///
    /// Returns the number of substeps actually simulated.
    fn step(&mut self, dt: f32) -> u32;

    /// Sets the global gravity vector.
    fn set_gravity(&mut self, gravity: Vec3);

    /// Returns the global gravity vector.
    fn gravity(&self) -> Vec3;

    /// Adds a rigid body to the simulation.
    fn add_body(&mut self, desc: RigidBodyDesc) -> RigidBodyHandle;

    /// Removes a rigid body and its colliders. Returns `false` for an unknown handle.
    fn remove_body(&mut self, handle: RigidBodyHandle) -> bool;

    /// Adds a collider to the simulation.
    ///
    /// Returns `None` if the parent body does not exist.
    fn add_collider(&mut self, desc: ColliderDesc) -> Option<ColliderHandle>;

    /// Removes a collider. Returns `false` for an unknown handle.
    fn remove_collider(&mut self, handle: ColliderHandle) -> bool;

    /// Whether `handle` refers to a live body.
    fn contains_body(&self, handle: RigidBodyHandle) -> bool;

    /// Number of live bodies.
    fn body_count(&self) -> usize;

    /// Number of bodies tagged with `owner`.
    fn bodies_owned_by(&self, owner: BodyOwner) -> usize;

    /// Position and rotation of a rigid body.
    fn body_transform(&self, handle: RigidBodyHandle) -> Option<(Vec3, Quat)>;

    /// Manually sets the position and rotation of a rigid body.
    fn set_body_transform(&mut self, handle: RigidBodyHandle, pos: Vec3, rot: Quat);

    /// Linear velocity of a rigid body.
    fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3>;

    /// Sets the linear velocity of a rigid body.
    fn set_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3);

    /// Angular velocity of a rigid body.
    fn angular_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3>;

    /// Sets the angular velocity of a rigid body.
    fn set_angular_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3);

    /// Wakes a sleeping body up.
    fn wake_up(&mut self, handle: RigidBodyHandle);

    /// Installs the channel notifications are pushed into after each step.
    fn set_notification_sink(&mut self, sink: flume::Sender<PhysicsNotification>);

    /// Enables or disables collection of debug lines.
    fn set_debug_drawing(&mut self, enabled: bool);

    /// Debug lines collected during the last step, empty while disabled.
    fn debug_lines(&self) -> &[DebugLine];
}
