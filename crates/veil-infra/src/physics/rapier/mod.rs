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

//! Rapier implementation of the physics provider.

mod conversions;
mod debug;
mod events;

use std::collections::HashMap;

use conversions::*;
use events::{RapierEventHandler, SensorTransition};
use rapier3d::prelude::{ColliderHandle as RapierColliderHandle, *};
use veil_core::error::InitializationError;
use veil_core::math::{Quat, Vec3};
use veil_core::physics::{
    BodyOwner, BodyType, ColliderDesc, ColliderHandle, ColliderShape, ContactReport, DebugLine,
    PhysicsNotification, PhysicsProvider, PhysicsSettings, RigidBodyDesc, RigidBodyHandle,
    TriggerReport,
};

/// Largest signed distance, in meters, at which a contact point counts as touching.
const TOUCH_DISTANCE: f32 = 1.0e-4;

/// Implementation of the `PhysicsProvider` trait using the Rapier3D physics engine.
///
/// The world is stepped in fixed substeps. Time that does not fill a whole
/// substep is carried over to the next call; time beyond `max_substeps` is
/// dropped, so a long stall shows up as slow motion instead of a catch-up burst.
pub struct RapierPhysicsWorld {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    gravity: Vector,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    event_handler: RapierEventHandler,
    sensor_transitions: flume::Receiver<SensorTransition>,

    settings: PhysicsSettings,
    accumulator: f64,
    /// Owner of every live collider, resolved at insertion.
    collider_owners: HashMap<RapierColliderHandle, BodyOwner>,
    /// Owners of colliders removed since the last simulated substep.
    retired_owners: HashMap<RapierColliderHandle, BodyOwner>,
    sink: Option<flume::Sender<PhysicsNotification>>,
    debug_drawing: bool,
    debug_lines: Vec<DebugLine>,
}

impl RapierPhysicsWorld {
    /// Creates an empty world, rejecting settings it cannot step with.
    pub fn new(settings: PhysicsSettings) -> Result<Self, InitializationError> {
        settings.validate()?;
        log::info!(
            "Rapier physics world created ({} substeps max of {:.5}s, gravity {:?}).",
            settings.max_substeps,
            settings.fixed_timestep,
            settings.gravity
        );
        Ok(Self::with_valid_settings(settings))
    }

    fn with_valid_settings(settings: PhysicsSettings) -> Self {
        let (event_handler, sensor_transitions) = RapierEventHandler::new();
        let integration_parameters = IntegrationParameters {
            dt: settings.fixed_timestep,
            ..Default::default()
        };
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: to_rapier_vec(settings.gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            event_handler,
            sensor_transitions,
            settings,
            accumulator: 0.0,
            collider_owners: HashMap::new(),
            retired_owners: HashMap::new(),
            sink: None,
            debug_drawing: false,
            debug_lines: Vec::new(),
        }
    }

    /// The settings this world steps with.
    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Number of live colliders.
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    fn single_step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &self.event_handler,
        );
    }

    fn owner_of(&self, handle: RapierColliderHandle) -> BodyOwner {
        self.collider_owners
            .get(&handle)
            .or_else(|| self.retired_owners.get(&handle))
            .copied()
            .unwrap_or_default()
    }

    fn notify(&self, notification: PhysicsNotification) {
        match &self.sink {
            Some(sink) => {
                if sink.send(notification).is_err() {
                    log::trace!("Physics notification dropped: sink disconnected.");
                }
            }
            None => log::trace!("Physics notification dropped: no sink installed."),
        }
    }

    /// One report per touching pair, taken from the manifolds left by the last substep.
    ///
    /// Speculative contacts (points still separated by a gap) are not touches.
    fn report_contacts(&self) {
        for pair in self.narrow_phase.contact_pairs() {
            let Some((manifold, contact)) = pair.manifolds.iter().find_map(|manifold| {
                manifold
                    .data
                    .solver_contacts
                    .iter()
                    .find(|contact| contact.dist <= TOUCH_DISTANCE)
                    .map(|contact| (manifold, contact))
            }) else {
                continue;
            };
            let a = self.owner_of(pair.collider1);
            let b = self.owner_of(pair.collider2);
            if !a.is_tagged() && !b.is_tagged() {
                continue;
            }
            let point = contact.point;
            let n = manifold.data.normal;
            self.notify(PhysicsNotification::Contact(ContactReport {
                a,
                b,
                position: Vec3::new(point.x, point.y, point.z),
                // Rapier's normal points out of the first collider.
                normal: -from_rapier_vec(n.x, n.y, n.z),
            }));
        }
    }

    fn report_sensor_transitions(&self) {
        for transition in self.sensor_transitions.try_iter() {
            let owner1 = self.owner_of(transition.collider1);
            let owner2 = self.owner_of(transition.collider2);
            let (trigger, other) = match (owner1, owner2) {
                (BodyOwner::Trigger(trigger), other) | (other, BodyOwner::Trigger(trigger)) => {
                    (trigger, other)
                }
                _ => {
                    log::trace!("Sensor transition between untracked colliders ignored.");
                    continue;
                }
            };
            self.notify(PhysicsNotification::Trigger(TriggerReport {
                trigger,
                other,
                contact: transition.started,
            }));
        }
    }

    fn retire_colliders(&mut self, handles: &[RapierColliderHandle]) {
        for handle in handles {
            if let Some(owner) = self.collider_owners.remove(handle) {
                self.retired_owners.insert(*handle, owner);
            }
        }
    }
}

impl Default for RapierPhysicsWorld {
    fn default() -> Self {
        Self::with_valid_settings(PhysicsSettings::default())
    }
}

impl PhysicsProvider for RapierPhysicsWorld {
    fn step(&mut self, dt: f32) -> u32 {
        let fixed = f64::from(self.settings.fixed_timestep);
        self.accumulator += f64::from(dt.max(0.0));
        // The epsilon keeps 4 x (1/240) from counting as 3.999... substeps.
        let wanted = ((self.accumulator + 1e-9) / fixed).floor() as u64;
        self.accumulator = (self.accumulator - wanted as f64 * fixed).max(0.0);

        let substeps = wanted.min(u64::from(self.settings.max_substeps)) as u32;
        if wanted > u64::from(substeps) {
            log::warn!(
                "Physics fell behind: simulating {substeps} of {wanted} substeps, {:.3}s dropped.",
                (wanted - u64::from(substeps)) as f64 * fixed
            );
        }

        for _ in 0..substeps {
            self.single_step();
        }

        if substeps > 0 {
            self.report_sensor_transitions();
            self.report_contacts();
            self.retired_owners.clear();
            if self.debug_drawing {
                debug::collect_aabb_lines(&self.collider_set, &mut self.debug_lines);
            }
        }
        substeps
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.settings.gravity = gravity;
        self.gravity = to_rapier_vec(gravity);
    }

    fn gravity(&self) -> Vec3 {
        self.settings.gravity
    }

    fn add_body(&mut self, desc: RigidBodyDesc) -> RigidBodyHandle {
        let rb_type = match desc.body_type {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
        };

        let mut builder = RigidBodyBuilder::new(rb_type)
            .translation(to_rapier_vec(desc.position))
            .rotation(to_scaled_axis(desc.rotation))
            .linvel(to_rapier_vec(desc.linear_velocity))
            .angvel(to_rapier_vec(desc.angular_velocity))
            .can_sleep(desc.can_sleep)
            .user_data(desc.owner.to_user_data());
        if desc.body_type == BodyType::Dynamic {
            builder = builder.additional_mass(desc.mass);
        }

        let handle = from_rapier_body(self.rigid_body_set.insert(builder.build()));
        log::trace!("Added {:?} body {handle:?} for {:?}.", desc.body_type, desc.owner);
        handle
    }

    fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        let rb_handle = to_rapier_body(handle);
        let attached: Vec<RapierColliderHandle> = match self.rigid_body_set.get(rb_handle) {
            Some(body) => body.colliders().to_vec(),
            None => return false,
        };
        self.retire_colliders(&attached);
        self.rigid_body_set
            .remove(
                rb_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    fn add_collider(&mut self, desc: ColliderDesc) -> Option<ColliderHandle> {
        let shape = match desc.shape {
            ColliderShape::Box(half) => SharedShape::cuboid(half.x, half.y, half.z),
            ColliderShape::Sphere(r) => SharedShape::ball(r),
            ColliderShape::Capsule(h, r) => SharedShape::capsule_y(h, r),
        };

        let parent = match desc.parent_body {
            Some(parent) => {
                let rb_handle = to_rapier_body(parent);
                let body = self.rigid_body_set.get(rb_handle)?;
                Some((rb_handle, BodyOwner::from_user_data(body.user_data)))
            }
            None => None,
        };
        let owner = match parent {
            Some((_, parent_owner)) if !desc.owner.is_tagged() => parent_owner,
            _ => desc.owner,
        };

        let mut builder = ColliderBuilder::new(shape)
            .translation(to_rapier_vec(desc.position))
            .rotation(to_scaled_axis(desc.rotation))
            .density(desc.density)
            .friction(desc.friction)
            .sensor(desc.sensor)
            .user_data(owner.to_user_data());
        if desc.sensor {
            builder = builder.active_events(ActiveEvents::COLLISION_EVENTS);
        }
        let collider = builder.build();

        let handle = match parent {
            Some((rb_handle, _)) => {
                self.collider_set
                    .insert_with_parent(collider, rb_handle, &mut self.rigid_body_set)
            }
            None => self.collider_set.insert(collider),
        };
        self.collider_owners.insert(handle, owner);
        Some(from_rapier_collider(handle))
    }

    fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        let cl_handle = to_rapier_collider(handle);
        self.retire_colliders(&[cl_handle]);
        self.collider_set
            .remove(
                cl_handle,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                true,
            )
            .is_some()
    }

    fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(to_rapier_body(handle))
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn bodies_owned_by(&self, owner: BodyOwner) -> usize {
        let tag = owner.to_user_data();
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.user_data == tag)
            .count()
    }

    fn body_transform(&self, handle: RigidBodyHandle) -> Option<(Vec3, Quat)> {
        let rb = self.rigid_body_set.get(to_rapier_body(handle))?;
        let t = rb.translation();
        let r = rb.rotation();
        Some((Vec3::new(t.x, t.y, t.z), Quat::new(r.x, r.y, r.z, r.w)))
    }

    fn set_body_transform(&mut self, handle: RigidBodyHandle, pos: Vec3, rot: Quat) {
        if let Some(rb) = self.rigid_body_set.get_mut(to_rapier_body(handle)) {
            rb.set_translation(to_rapier_vec(pos), true);
            rb.set_rotation(to_rapier_quat(rot), true);
        }
    }

    fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        let v = self.rigid_body_set.get(to_rapier_body(handle))?.linvel();
        Some(Vec3::new(v.x, v.y, v.z))
    }

    fn set_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(rb) = self.rigid_body_set.get_mut(to_rapier_body(handle)) {
            rb.set_linvel(to_rapier_vec(velocity), true);
        }
    }

    fn angular_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        let v = self.rigid_body_set.get(to_rapier_body(handle))?.angvel();
        Some(Vec3::new(v.x, v.y, v.z))
    }

    fn set_angular_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(rb) = self.rigid_body_set.get_mut(to_rapier_body(handle)) {
            rb.set_angvel(to_rapier_vec(velocity), true);
        }
    }

    fn wake_up(&mut self, handle: RigidBodyHandle) {
        if let Some(rb) = self.rigid_body_set.get_mut(to_rapier_body(handle)) {
            rb.wake_up(true);
        }
    }

    fn set_notification_sink(&mut self, sink: flume::Sender<PhysicsNotification>) {
        self.sink = Some(sink);
    }

    fn set_debug_drawing(&mut self, enabled: bool) {
        self.debug_drawing = enabled;
        if !enabled {
            self.debug_lines.clear();
        }
    }

    fn debug_lines(&self) -> &[DebugLine] {
        &self.debug_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::physics::ObjectId;

    fn ball(world: &mut RapierPhysicsWorld, y: f32, owner: BodyOwner) -> RigidBodyHandle {
        let body = world.add_body(RigidBodyDesc::dynamic(Vec3::new(0.0, y, 0.0), 1.0, owner));
        world
            .add_collider(ColliderDesc::attached(body, ColliderShape::Sphere(0.5)))
            .expect("parent exists");
        body
    }

    #[test]
    fn test_substeps_are_fixed_and_capped() {
        let mut world = RapierPhysicsWorld::default();
        assert_eq!(world.step(1.0 / 60.0), 4, "1/60s is four 1/240s substeps");
        assert_eq!(world.step(1.0 / 480.0), 0, "half a substep is carried over");
        assert_eq!(world.step(1.0 / 480.0), 1, "the carried half completes a substep");
        assert_eq!(world.step(1.0), 10, "a stall is capped at ten substeps");
        assert_eq!(world.step(0.0), 0, "dropped time is not caught up later");
    }

    #[test]
    fn test_invalid_settings_are_an_initialization_error() {
        let settings = PhysicsSettings {
            max_substeps: 0,
            ..Default::default()
        };
        assert!(matches!(
            RapierPhysicsWorld::new(settings),
            Err(InitializationError::InvalidPhysicsSettings(_))
        ));
    }

    #[test]
    fn test_gravity_pulls_dynamic_bodies_down() {
        let mut world = RapierPhysicsWorld::default();
        let body = ball(&mut world, 10.0, BodyOwner::Object(ObjectId(1)));
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        let (pos, _) = world.body_transform(body).expect("body exists");
        assert!(pos.y < 10.0, "body should fall, got y = {}", pos.y);
        assert_eq!(pos.x, 0.0);
    }

    #[test]
    fn test_removed_handle_is_stale() {
        let mut world = RapierPhysicsWorld::default();
        let first = ball(&mut world, 0.0, BodyOwner::Player);
        assert!(world.remove_body(first));
        assert!(!world.remove_body(first), "second removal must report failure");
        let second = ball(&mut world, 0.0, BodyOwner::Player);
        assert_ne!(first, second, "a recycled slot gets a new generation");
        assert!(!world.contains_body(first));
        assert!(world.contains_body(second));
        assert_eq!(world.bodies_owned_by(BodyOwner::Player), 1);
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn test_collider_on_missing_parent_is_rejected() {
        let mut world = RapierPhysicsWorld::default();
        let body = ball(&mut world, 0.0, BodyOwner::Untagged);
        world.remove_body(body);
        let desc = ColliderDesc::attached(body, ColliderShape::Sphere(1.0));
        assert!(world.add_collider(desc).is_none());
    }

    #[test]
    fn test_debug_lines_only_when_enabled() {
        let mut world = RapierPhysicsWorld::default();
        ball(&mut world, 0.0, BodyOwner::Untagged);
        world.step(1.0 / 60.0);
        assert!(world.debug_lines().is_empty());

        world.set_debug_drawing(true);
        world.step(1.0 / 60.0);
        assert_eq!(world.debug_lines().len(), 12);

        world.set_debug_drawing(false);
        assert!(world.debug_lines().is_empty());
    }

    #[test]
    fn test_transform_and_velocity_accessors() {
        let mut world = RapierPhysicsWorld::default();
        let body = ball(&mut world, 0.0, BodyOwner::Untagged);
        world.set_body_transform(body, Vec3::new(1.0, 2.0, 3.0), Quat::from_yaw(0.3));
        world.set_linear_velocity(body, Vec3::new(0.0, 4.0, 0.0));
        world.set_angular_velocity(body, Vec3::ZERO);

        let (pos, rot) = world.body_transform(body).expect("body exists");
        assert_eq!(pos, Vec3::new(1.0, 2.0, 3.0));
        assert!((rot.yaw() - 0.3).abs() < 1e-5);
        assert_eq!(world.linear_velocity(body), Some(Vec3::new(0.0, 4.0, 0.0)));
        assert_eq!(world.angular_velocity(body), Some(Vec3::ZERO));
    }
}
