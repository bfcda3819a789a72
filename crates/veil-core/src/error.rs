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

//! Error types shared by the engine contracts.
//!
//! Two classes live here: [`InitializationError`] for failures that prevent a
//! subsystem from running at all, and [`PlayerError`] for misuse of the player
//! body API. Recoverable conditions (a listener that went away, a trigger no one
//! listens to) are not errors and have no type.

use thiserror::Error;

use crate::physics::RigidBodyHandle;
use crate::pose::VrBackend;

/// A subsystem could not be brought up, or lost the resource it runs on.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// The requested VR runtime is not present or refused the session.
    #[error("VR runtime {backend:?} is unavailable: {reason}")]
    RuntimeUnavailable {
        /// Backend that was requested.
        backend: VrBackend,
        /// Human readable cause.
        reason: String,
    },
    /// A running tracking session stopped producing poses.
    #[error("tracking session lost: {0}")]
    SessionLost(String),
    /// The physics world was configured with values it cannot run with.
    #[error("invalid physics settings: {0}")]
    InvalidPhysicsSettings(String),
}

/// Misuse of the player body API.
#[derive(Debug, Error, PartialEq)]
pub enum PlayerError {
    /// A physics accessor was called before the player body got a rigid body.
    #[error("the player has no physics body yet")]
    NoPhysicsBody,
    /// A physical parameter was changed after `lock_parameters()`.
    #[error("player parameter `{parameter}` is locked")]
    ParametersLocked {
        /// Name of the rejected parameter.
        parameter: &'static str,
    },
    /// A physical parameter was given a value outside its domain.
    #[error("invalid value {value} for player parameter `{parameter}`")]
    InvalidParameter {
        /// Name of the rejected parameter.
        parameter: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The player's rigid body handle no longer resolves in the physics world.
    #[error("player rigid body {0:?} is not in the physics world")]
    StaleBody(RigidBodyHandle),
}
