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

//! The player body.
//!
//! [`PlayerBody`] owns the gameplay view of the player: where the feet are,
//! where the body faces and what the controls are asking for. Each frame it is
//! reconciled with exactly one authority, selected by [`PlayerMode`]:
//!
//! - **Standing**: a capsule rigid body is simulated and the feet position is
//!   read back from it after the [`PlayerActuator`] ran.
//! - **RoomScale**: the tracked head is authoritative; the rigid body is
//!   pinned to it and only exists to register collisions.

mod actuator;

pub use self::actuator::{DefaultActuator, PlayerActuator};

use serde::{Deserialize, Serialize};
use veil_core::math::{BodyOrientation, Quat, Vec3};
use veil_core::physics::{
    BodyOwner, ColliderDesc, ColliderHandle, ColliderShape, PhysicsProvider, RigidBodyDesc,
    RigidBodyHandle,
};
use veil_core::pose::{CameraRig, Pose};
use veil_core::PlayerError;

use crate::config::{PlayerConfig, PlayerTuning};

/// Radius of the player capsule.
pub const CAPSULE_RADIUS: f32 = 0.25;

/// Which authority drives the player position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerMode {
    /// Not decided yet; `engine_update` does nothing.
    #[default]
    Unknown,
    /// Position simulated by the physics capsule.
    Standing,
    /// Position follows the tracked head.
    RoomScale,
}

/// A digital walking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkDirection {
    /// Towards `-Z` of the body.
    Forward,
    /// Towards `+Z` of the body.
    Backward,
    /// Towards `-X` of the body.
    Left,
    /// Towards `+X` of the body.
    Right,
}

impl WalkDirection {
    const fn index(self) -> usize {
        self as usize
    }
}

/// Tunable physical parameters of the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
    /// Height of the eyes above the feet.
    pub eye_height: f32,
    /// Walking speed in meters per second.
    pub walk_speed: f32,
    /// Speed multiplier while running.
    pub run_factor: f32,
    /// Turn speed.
    pub turn_speed: f32,
    /// Mass in kg.
    pub mass: f32,
    /// Feet position.
    pub feet_position: Vec3,
    /// Body orientation.
    pub orientation: BodyOrientation,
}

impl Default for PhysicalParameters {
    fn default() -> Self {
        Self {
            eye_height: 1.59,
            walk_speed: 3.0,
            run_factor: 3.0,
            turn_speed: 0.15,
            mass: 80.0,
            feet_position: Vec3::new(0.0, 0.0, 10.0),
            orientation: BodyOrientation::IDENTITY,
        }
    }
}

/// The player: gameplay state, locomotion intent and its physics capsule.
pub struct PlayerBody {
    params: PhysicalParameters,
    mode: PlayerMode,
    locked: bool,

    walking: [bool; 4],
    analog_walk: f32,
    analog_straff: f32,
    analog_rotate: f32,
    run: bool,
    standing: bool,
    ignore_physics: bool,
    contact_with_ground: bool,
    jump_speed: f32,
    tuning: PlayerTuning,

    /// Tracking-space origin in gameplay space (room-scale).
    room_base: Vec3,
    translation_reference: Quat,
    need_new_reference: bool,
    /// Latest head pose, tracking-local.
    local_head: Pose,
    update_time: f32,

    body: Option<RigidBodyHandle>,
    collider: Option<ColliderHandle>,
    actuator: Option<Box<dyn PlayerActuator>>,
}

impl std::fmt::Debug for PlayerBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerBody")
            .field("params", &self.params)
            .field("mode", &self.mode)
            .field("locked", &self.locked)
            .field("room_base", &self.room_base)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self::new(PhysicalParameters::default())
    }
}

impl PlayerBody {
    /// Creates an unlocked player in [`PlayerMode::Unknown`] without a rigid body.
    pub fn new(params: PhysicalParameters) -> Self {
        log::debug!("Creating player body at {:?}.", params.feet_position);
        Self {
            room_base: params.feet_position,
            params,
            mode: PlayerMode::Unknown,
            locked: false,
            walking: [false; 4],
            analog_walk: 0.0,
            analog_straff: 0.0,
            analog_rotate: 0.0,
            run: false,
            standing: true,
            ignore_physics: false,
            contact_with_ground: false,
            jump_speed: 4.0,
            tuning: PlayerTuning::default(),
            translation_reference: Quat::IDENTITY,
            need_new_reference: true,
            local_head: Pose::IDENTITY,
            update_time: 0.0,
            body: None,
            collider: None,
            actuator: Some(Box::new(DefaultActuator)),
        }
    }

    /// Creates a player from its configuration. The mode is set but no body is created.
    pub fn from_config(config: &PlayerConfig) -> Self {
        let mut player = Self::new(PhysicalParameters {
            eye_height: config.eye_height,
            walk_speed: config.walk_speed,
            run_factor: config.run_factor,
            turn_speed: config.turn_speed,
            mass: config.mass,
            feet_position: config.start_position,
            orientation: BodyOrientation::from_yaw(config.start_yaw),
        });
        player.mode = config.mode;
        player.standing = config.standing_stabilization;
        player.jump_speed = config.jump_speed;
        player.tuning = config.tuning;
        player
    }

    // --- Parameters ---

    /// Feet position in gameplay space.
    pub fn position(&self) -> Vec3 {
        self.params.feet_position
    }

    /// Body orientation.
    pub fn orientation(&self) -> BodyOrientation {
        self.params.orientation
    }

    /// Height of the eyes above the feet.
    pub fn eye_height(&self) -> f32 {
        self.params.eye_height
    }

    /// Walking speed.
    pub fn walk_speed(&self) -> f32 {
        self.params.walk_speed
    }

    /// Running speed multiplier.
    pub fn run_factor(&self) -> f32 {
        self.params.run_factor
    }

    /// Turn speed.
    pub fn turn_speed(&self) -> f32 {
        self.params.turn_speed
    }

    /// Mass in kg.
    pub fn mass(&self) -> f32 {
        self.params.mass
    }

    /// Current mode.
    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    /// Control tuning constants.
    pub fn tuning(&self) -> PlayerTuning {
        self.tuning
    }

    /// Replaces the control tuning constants.
    pub fn set_tuning(&mut self, tuning: PlayerTuning) {
        self.tuning = tuning;
    }

    /// Room-scale tracking origin in gameplay space.
    pub fn room_base(&self) -> Vec3 {
        self.room_base
    }

    /// Moves the feet. Always allowed.
    ///
    /// In room-scale mode the tracking origin moves along, so the change
    /// survives the next reconciliation.
    pub fn set_position(&mut self, position: Vec3) {
        if self.mode == PlayerMode::RoomScale {
            self.room_base += position - self.params.feet_position;
        }
        self.params.feet_position = position;
    }

    /// Turns the body. Always allowed.
    pub fn set_orientation(&mut self, orientation: BodyOrientation) {
        self.params.orientation = orientation;
    }

    /// Sets the eye height; must be positive.
    pub fn set_eyes_height(&mut self, eye_height: f32) -> Result<(), PlayerError> {
        self.check_param("eye_height", eye_height, |v| v > 0.0)?;
        self.params.eye_height = eye_height;
        Ok(())
    }

    /// Sets the walk speed; must not be negative.
    pub fn set_walk_speed(&mut self, walk_speed: f32) -> Result<(), PlayerError> {
        self.check_param("walk_speed", walk_speed, |v| v >= 0.0)?;
        self.params.walk_speed = walk_speed;
        Ok(())
    }

    /// Sets the turn speed; must not be negative.
    pub fn set_turn_speed(&mut self, turn_speed: f32) -> Result<(), PlayerError> {
        self.check_param("turn_speed", turn_speed, |v| v >= 0.0)?;
        self.params.turn_speed = turn_speed;
        Ok(())
    }

    /// Sets the run multiplier; must be positive.
    pub fn set_run_factor(&mut self, run_factor: f32) -> Result<(), PlayerError> {
        self.check_param("run_factor", run_factor, |v| v > 0.0)?;
        self.params.run_factor = run_factor;
        Ok(())
    }

    /// Sets the mass; must be positive. Takes effect on the next physics reset.
    pub fn set_mass(&mut self, mass: f32) -> Result<(), PlayerError> {
        self.check_param("mass", mass, |v| v > 0.0)?;
        self.params.mass = mass;
        Ok(())
    }

    fn check_param(
        &self,
        parameter: &'static str,
        value: f32,
        valid: impl Fn(f32) -> bool,
    ) -> Result<(), PlayerError> {
        if self.locked {
            return Err(PlayerError::ParametersLocked { parameter });
        }
        if !value.is_finite() || !valid(value) {
            return Err(PlayerError::InvalidParameter { parameter, value });
        }
        Ok(())
    }

    /// Freezes eye height, speeds and mass.
    pub fn lock_parameters(&mut self) {
        self.locked = true;
    }

    /// Allows the physical parameters to change again.
    pub fn unlock_parameters(&mut self) {
        self.locked = false;
    }

    /// Whether the physical parameters are frozen.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Replaces the actuator used in standing mode.
    pub fn set_actuator(&mut self, actuator: Box<dyn PlayerActuator>) {
        self.actuator = Some(actuator);
    }

    /// Whether the standing capsule is kept upright.
    pub fn is_standing(&self) -> bool {
        self.standing
    }

    /// Enables or disables keeping the standing capsule upright.
    pub fn set_standing(&mut self, standing: bool) {
        self.standing = standing;
    }

    /// Skips reconciliation entirely, for menus and splash screens.
    pub fn set_ignore_physics(&mut self, ignore: bool) {
        self.ignore_physics = ignore;
    }

    /// Whether reconciliation is skipped.
    pub fn ignores_physics(&self) -> bool {
        self.ignore_physics
    }

    /// Whether the capsule touched the ground during the last physics step.
    pub fn contact_with_ground(&self) -> bool {
        self.contact_with_ground
    }

    pub(crate) fn set_contact_with_ground(&mut self, contact: bool) {
        self.contact_with_ground = contact;
    }

    // --- Intent ---

    /// Holds or releases a digital walking direction.
    pub fn set_walking(&mut self, direction: WalkDirection, active: bool) {
        self.walking[direction.index()] = active;
    }

    /// Whether a digital walking direction is held.
    pub fn is_walking(&self, direction: WalkDirection) -> bool {
        self.walking[direction.index()]
    }

    /// Analog forward/backward intent, negative is forward.
    pub fn set_analog_walk(&mut self, value: f32) {
        self.analog_walk = value;
    }

    /// Analog sideways intent, positive is right.
    pub fn set_analog_straff(&mut self, value: f32) {
        self.analog_straff = value;
    }

    /// Analog turn intent.
    pub fn set_analog_rotate(&mut self, value: f32) {
        self.analog_rotate = value;
    }

    /// Holds or releases the run modifier.
    pub fn set_run(&mut self, run: bool) {
        self.run = run;
    }

    /// Whether the run modifier is held.
    pub fn is_running(&self) -> bool {
        self.run
    }

    /// Digital walking intent as a unit vector in body space, zero when idle.
    pub fn translate_intent(&self) -> Vec3 {
        let mut translation = Vec3::ZERO;
        if self.is_walking(WalkDirection::Forward) {
            translation.z -= 1.0;
        }
        if self.is_walking(WalkDirection::Backward) {
            translation.z += 1.0;
        }
        if self.is_walking(WalkDirection::Left) {
            translation.x -= 1.0;
        }
        if self.is_walking(WalkDirection::Right) {
            translation.x += 1.0;
        }
        translation.normalize_or_zero()
    }

    /// Analog walking intent in body space.
    pub fn analog_translate_intent(&self) -> Vec3 {
        Vec3::new(self.analog_straff, 0.0, self.analog_walk)
    }

    // --- Rotation ---

    /// Turns the body by `angle` radians around the world up axis.
    ///
    /// In room-scale mode the tracking space pivots around the ground
    /// projection of the head, so the head stays in place.
    pub fn apply_relative_body_yaw(&mut self, angle: f32) {
        match self.mode {
            PlayerMode::RoomScale => {
                let head = self.tracked_head_pose().position;
                let pivot = Vec3::new(head.x, self.room_base.y, head.z);
                let rotation = Quat::from_yaw(angle);
                self.params.orientation.add_yaw(angle);
                self.room_base = pivot + rotation * (self.room_base - pivot);
                self.translation_reference = rotation * self.translation_reference;
            }
            _ => self.params.orientation.add_yaw(angle),
        }
    }

    /// Applies the analog rotate intent scaled by the frame time.
    pub fn apply_analog_yaw(&mut self) {
        let value =
            self.tuning.analog_yaw_factor * self.analog_rotate * self.turn_speed() * self.update_time;
        if value != 0.0 {
            self.apply_relative_body_yaw(value);
        }
    }

    /// Turns the body from relative mouse motion.
    pub fn apply_mouse_relative_rotation(&mut self, relative: i32) {
        let scaled = (relative as f32 * self.tuning.mouse_sensitivity).trunc();
        if scaled != 0.0 {
            self.apply_relative_body_yaw(-scaled * self.turn_speed() * self.update_time);
        }
    }

    // --- Tracking ---

    /// Stores this frame's tracking-local head pose.
    pub fn set_tracked_head_pose(&mut self, local: Pose) {
        self.local_head = local;
    }

    /// The gameplay frame tracking space is attached to.
    pub fn camera_rig(&self) -> CameraRig {
        match self.mode {
            PlayerMode::RoomScale => CameraRig {
                feet: self.room_base,
                orientation: Quat::from_yaw(self.params.orientation.yaw),
                eye_height: self.params.eye_height,
            },
            _ => CameraRig {
                feet: self.params.feet_position,
                orientation: self.params.orientation.to_quat(),
                eye_height: self.params.eye_height,
            },
        }
    }

    /// This frame's head pose in gameplay space.
    pub fn tracked_head_pose(&self) -> Pose {
        self.camera_rig().to_world(&self.local_head)
    }

    /// Sets the ground height under the tracking space (room-scale only).
    pub fn reground(&mut self, ground_y: f32) {
        if self.mode != PlayerMode::RoomScale {
            return;
        }
        log::debug!("Re-grounding player to y = {ground_y}.");
        self.room_base.y = ground_y;
        self.params.feet_position.y = ground_y;
    }

    // --- Physics ---

    /// Whether the player has a rigid body.
    pub fn has_physics(&self) -> bool {
        self.body.is_some()
    }

    /// The player's rigid body.
    pub fn body(&self) -> Result<RigidBodyHandle, PlayerError> {
        self.body.ok_or(PlayerError::NoPhysicsBody)
    }

    /// The capsule collider of the player's rigid body.
    pub fn collider(&self) -> Result<ColliderHandle, PlayerError> {
        self.collider.ok_or(PlayerError::NoPhysicsBody)
    }

    /// Creates the capsule body, or recreates it if one exists.
    pub fn init_physics(&mut self, physics: &mut dyn PhysicsProvider) -> Result<(), PlayerError> {
        if self.has_physics() {
            return self.reset_player_physics(physics);
        }
        self.create_body(physics)
    }

    /// Destroys the rigid body and builds a fresh one at the current feet.
    ///
    /// Does nothing when the player has no body yet.
    pub fn reset_player_physics(
        &mut self,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        let Some(old) = self.body.take() else {
            return Ok(());
        };
        self.collider = None;
        log::debug!("Resetting player physics, dropping body {old:?}.");
        if !physics.remove_body(old) {
            log::warn!("Player body {old:?} was already gone from the physics world.");
        }
        self.create_body(physics)
    }

    fn create_body(&mut self, physics: &mut dyn PhysicsProvider) -> Result<(), PlayerError> {
        let half_eye = Vec3::new(0.0, self.params.eye_height / 2.0, 0.0);
        let half_height = ((self.params.eye_height - 2.0 * CAPSULE_RADIUS) / 2.0).max(0.0);
        let body = physics.add_body(RigidBodyDesc::dynamic(
            self.params.feet_position + half_eye,
            self.params.mass,
            BodyOwner::Player,
        ));
        let collider = physics
            .add_collider(ColliderDesc::attached(
                body,
                ColliderShape::Capsule(half_height, CAPSULE_RADIUS),
            ))
            .ok_or(PlayerError::StaleBody(body))?;
        self.body = Some(body);
        self.collider = Some(collider);
        Ok(())
    }

    /// Moves the player and rebuilds its physics so no velocity survives.
    ///
    /// `yaw` replaces the body heading when given.
    pub fn teleport(
        &mut self,
        position: Vec3,
        yaw: Option<f32>,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        self.set_position(position);
        if let Some(yaw) = yaw {
            self.set_orientation(BodyOrientation::from_yaw(yaw));
        }
        self.reset_player_physics(physics)
    }

    /// Switches the locomotion authority and rebuilds the body.
    pub fn set_mode(
        &mut self,
        mode: PlayerMode,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        if mode == self.mode {
            return Ok(());
        }
        log::info!("Player mode {:?} -> {mode:?}.", self.mode);
        if mode == PlayerMode::RoomScale {
            self.room_base = self.params.feet_position;
        }
        self.mode = mode;
        self.need_new_reference = true;
        self.reset_player_physics(physics)
    }

    /// Reconciles the player with its authority for this frame.
    pub fn engine_update(
        &mut self,
        dt: f32,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        self.update_time = dt;
        if self.ignore_physics {
            return Ok(());
        }
        match self.mode {
            PlayerMode::Standing => self.update_standing(dt, physics),
            PlayerMode::RoomScale => self.update_room_scale(dt, physics),
            PlayerMode::Unknown => Ok(()),
        }
    }

    fn update_standing(
        &mut self,
        dt: f32,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        let body = self.body()?;
        self.apply_analog_yaw();
        physics.wake_up(body);

        if let Some(mut actuator) = self.actuator.take() {
            let result = actuator.actuate(self, physics, dt);
            self.actuator = Some(actuator);
            result?;
        }

        let (center, rotation) = physics
            .body_transform(body)
            .ok_or(PlayerError::StaleBody(body))?;
        self.params.feet_position =
            center - rotation * Vec3::new(0.0, self.params.eye_height / 2.0, 0.0);
        Ok(())
    }

    fn update_room_scale(
        &mut self,
        dt: f32,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        self.apply_analog_yaw();
        if self.need_new_reference {
            self.translation_reference = self.tracked_head_pose().orientation.yaw_only();
        }

        let translation = self.translation_reference
            * (self.translate_intent() + self.analog_translate_intent())
            * (dt * self.walk_speed());
        if translation.is_zero() {
            self.need_new_reference = true;
        } else {
            self.need_new_reference = false;
            self.room_base += translation;
        }

        let head = self.tracked_head_pose().position;
        self.params.feet_position = Vec3::new(head.x, self.room_base.y, head.z);
        self.sync_to_tracked_pose(physics)
    }

    /// Pins the rigid body to the tracked head (room-scale only).
    pub fn sync_to_tracked_pose(
        &self,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PlayerError> {
        if self.mode != PlayerMode::RoomScale {
            return Ok(());
        }
        let Some(body) = self.body else {
            return Ok(());
        };
        if !physics.contains_body(body) {
            return Err(PlayerError::StaleBody(body));
        }
        let head = self.tracked_head_pose();
        physics.set_angular_velocity(body, Vec3::ZERO);
        physics.set_linear_velocity(body, Vec3::ZERO);
        physics.set_body_transform(body, head.position, head.orientation);
        physics.wake_up(body);
        Ok(())
    }

    /// Gives the player an upward velocity if it stands on the ground.
    ///
    /// Returns whether the jump happened.
    pub fn jump(&mut self, physics: &mut dyn PhysicsProvider) -> Result<bool, PlayerError> {
        if self.mode != PlayerMode::Standing || !self.contact_with_ground {
            return Ok(false);
        }
        let body = self.body()?;
        let velocity = physics
            .linear_velocity(body)
            .ok_or(PlayerError::StaleBody(body))?;
        physics.set_linear_velocity(body, velocity.with_y(self.jump_speed));
        self.contact_with_ground = false;
        Ok(true)
    }
}
