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

//! Strategies turning locomotion intent into rigid body motion.

use veil_core::math::{Quat, Vec3};
use veil_core::physics::PhysicsProvider;
use veil_core::PlayerError;

use super::PlayerBody;

/// Converts the player's locomotion intent into physics state.
///
/// Called once per frame by [`PlayerBody::engine_update`] in standing mode,
/// after the analog yaw is applied and before the body position is read back.
/// The actuator only gets a shared view of the player; it acts through
/// `physics`.
pub trait PlayerActuator {
    /// Applies this frame's intent to the player's rigid body.
    fn actuate(
        &mut self,
        player: &PlayerBody,
        physics: &mut dyn PhysicsProvider,
        dt: f32,
    ) -> Result<(), PlayerError>;
}

/// Sets the horizontal velocity directly from the intent and keeps the capsule upright.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultActuator;

impl PlayerActuator for DefaultActuator {
    fn actuate(
        &mut self,
        player: &PlayerBody,
        physics: &mut dyn PhysicsProvider,
        _dt: f32,
    ) -> Result<(), PlayerError> {
        let body = player.body()?;
        let current = physics
            .linear_velocity(body)
            .ok_or(PlayerError::StaleBody(body))?;

        let intent = (player.translate_intent() + player.analog_translate_intent())
            * player.walk_speed();
        let velocity = if intent.is_zero() {
            Vec3::new(0.0, current.y, 0.0)
        } else {
            let mut horizontal = Quat::from_yaw(player.orientation().yaw) * intent;
            if player.is_running() {
                horizontal = horizontal * player.run_factor();
            }
            horizontal.with_y(current.y)
        };
        physics.set_linear_velocity(body, velocity);

        if player.is_standing() {
            let (position, _) = physics
                .body_transform(body)
                .ok_or(PlayerError::StaleBody(body))?;
            physics.set_body_transform(body, position, Quat::IDENTITY);
            physics.set_angular_velocity(body, Vec3::ZERO);
        }
        Ok(())
    }
}
