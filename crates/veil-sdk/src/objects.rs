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

//! Game objects and trigger volumes.
//!
//! The manager hands out [`ObjectId`]s and [`TriggerId`]s and tags the physics
//! bodies it creates with them, so contact reports can be mapped back to
//! objects without the physics world knowing anything about gameplay.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use veil_core::math::{Quat, Vec3};
use veil_core::physics::{
    BodyOwner, ColliderDesc, ColliderHandle, ColliderShape, ObjectId, PhysicsProvider,
    RigidBodyDesc, RigidBodyHandle, TriggerId,
};

/// Invalid physics setup on a game object.
#[derive(Debug, Error, PartialEq)]
pub enum PhysicsSetupError {
    /// An ancestor of the object already has a rigid body.
    #[error("object {object} cannot get a body: its parent {parent} already has one")]
    ParentHasBody {
        /// The object being set up.
        object: ObjectId,
        /// The ancestor owning a body.
        parent: ObjectId,
    },
    /// A descendant of the object already has a rigid body.
    #[error("object {object} cannot get a body: its child {child} already has one")]
    ChildHasBody {
        /// The object being set up.
        object: ObjectId,
        /// The descendant owning a body.
        child: ObjectId,
    },
    /// The object already has a rigid body.
    #[error("object {0} already has a body")]
    AlreadyHasBody(ObjectId),
    /// No object with this id exists.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
    /// Mass must be zero (static) or positive.
    #[error("invalid mass {0}")]
    InvalidMass(f32),
    /// Attaching would make an object its own ancestor.
    #[error("object {object} cannot be attached under its own descendant {parent}")]
    CyclicAttachment {
        /// The object being attached.
        object: ObjectId,
        /// The requested parent.
        parent: ObjectId,
    },
    /// The physics world refused the collider.
    #[error("the physics world rejected the collider of object {0}")]
    ColliderRejected(ObjectId),
    /// The physics world refused the sensor volume.
    #[error("the physics world rejected trigger {0}")]
    TriggerRejected(TriggerId),
}

/// A named entity with a transform and an optional rigid body.
#[derive(Debug, Clone)]
pub struct GameObject {
    id: ObjectId,
    name: String,
    position: Vec3,
    orientation: Quat,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    body: Option<RigidBodyHandle>,
    collider: Option<ColliderHandle>,
    mass: f32,
}

impl GameObject {
    /// Identifier.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World position; read back from the body for physical objects.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World orientation.
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Parent object, if attached.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Attached children.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Rigid body, if physics was set up.
    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }

    /// Mass given to [`GameObjectManager::setup_physics`]; zero for static bodies.
    pub fn mass(&self) -> f32 {
        self.mass
    }
}

/// A sensor volume reporting enter/leave transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerObject {
    /// Identifier carried by trigger events.
    pub id: TriggerId,
    /// Volume shape.
    pub shape: ColliderShape,
    /// World position.
    pub position: Vec3,
    collider: ColliderHandle,
}

/// Owns game objects and triggers.
#[derive(Debug, Default)]
pub struct GameObjectManager {
    objects: BTreeMap<ObjectId, GameObject>,
    names: HashMap<String, ObjectId>,
    triggers: BTreeMap<TriggerId, TriggerObject>,
    next_object: u64,
    next_trigger: u64,
}

impl GameObjectManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object without physics.
    pub fn create_object(
        &mut self,
        name: impl Into<String>,
        position: Vec3,
        orientation: Quat,
    ) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        let name = name.into();
        if let Some(previous) = self.names.insert(name.clone(), id) {
            log::warn!("Object name '{name}' reused; {previous} is no longer reachable by name.");
        }
        log::debug!("Created object {id} '{name}'.");
        self.objects.insert(
            id,
            GameObject {
                id,
                name,
                position,
                orientation,
                parent: None,
                children: Vec::new(),
                body: None,
                collider: None,
                mass: 0.0,
            },
        );
        id
    }

    /// Looks an object up.
    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    /// Looks an object up by name.
    pub fn object_by_name(&self, name: &str) -> Option<&GameObject> {
        self.names.get(name).and_then(|id| self.objects.get(id))
    }

    /// Every object, by id.
    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether there is no object.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn get(&self, id: ObjectId) -> Result<&GameObject, PhysicsSetupError> {
        self.objects
            .get(&id)
            .ok_or(PhysicsSetupError::UnknownObject(id))
    }

    /// The first ancestor of `id` with a body.
    fn ancestor_with_body(&self, id: ObjectId) -> Option<ObjectId> {
        let mut current = self.objects.get(&id)?.parent;
        while let Some(parent_id) = current {
            let parent = self.objects.get(&parent_id)?;
            if parent.body.is_some() {
                return Some(parent_id);
            }
            current = parent.parent;
        }
        None
    }

    /// The first descendant of `id` with a body, depth first.
    fn descendant_with_body(&self, id: ObjectId) -> Option<ObjectId> {
        let mut stack: Vec<ObjectId> = self.objects.get(&id)?.children.clone();
        while let Some(child_id) = stack.pop() {
            let Some(child) = self.objects.get(&child_id) else {
                continue;
            };
            if child.body.is_some() {
                return Some(child_id);
            }
            stack.extend(child.children.iter().copied());
        }
        None
    }

    fn is_ancestor(&self, candidate: ObjectId, of: ObjectId) -> bool {
        let mut current = self.objects.get(&of).and_then(|o| o.parent);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.objects.get(&id).and_then(|o| o.parent);
        }
        false
    }

    /// Attaches `child` under `parent`, detaching it from any previous parent.
    ///
    /// Fails when both sides of the link would own a rigid body, since the
    /// child's transform would then have two authorities.
    pub fn attach(&mut self, child: ObjectId, parent: ObjectId) -> Result<(), PhysicsSetupError> {
        self.get(parent)?;
        let child_obj = self.get(child)?;
        if child == parent || self.is_ancestor(child, parent) {
            return Err(PhysicsSetupError::CyclicAttachment {
                object: child,
                parent,
            });
        }

        let parent_authority = if self.get(parent)?.body.is_some() {
            Some(parent)
        } else {
            self.ancestor_with_body(parent)
        };
        let child_has_physics =
            child_obj.body.is_some() || self.descendant_with_body(child).is_some();
        if let (Some(owner), true) = (parent_authority, child_has_physics) {
            return Err(PhysicsSetupError::ParentHasBody {
                object: child,
                parent: owner,
            });
        }

        self.detach(child)?;
        if let Some(obj) = self.objects.get_mut(&child) {
            obj.parent = Some(parent);
        }
        if let Some(obj) = self.objects.get_mut(&parent) {
            obj.children.push(child);
        }
        Ok(())
    }

    /// Detaches `child` from its parent, if any.
    pub fn detach(&mut self, child: ObjectId) -> Result<(), PhysicsSetupError> {
        let previous = self
            .objects
            .get_mut(&child)
            .ok_or(PhysicsSetupError::UnknownObject(child))?
            .parent
            .take();
        if let Some(parent) = previous.and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|&c| c != child);
        }
        Ok(())
    }

    /// Gives an object a rigid body and a collider.
    ///
    /// A mass of zero makes a static body.
    pub fn setup_physics(
        &mut self,
        id: ObjectId,
        mass: f32,
        shape: ColliderShape,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<RigidBodyHandle, PhysicsSetupError> {
        let object = self.get(id)?;
        if object.body.is_some() {
            return Err(PhysicsSetupError::AlreadyHasBody(id));
        }
        if !(mass.is_finite() && mass >= 0.0) {
            return Err(PhysicsSetupError::InvalidMass(mass));
        }
        if let Some(parent) = self.ancestor_with_body(id) {
            return Err(PhysicsSetupError::ParentHasBody { object: id, parent });
        }
        if let Some(child) = self.descendant_with_body(id) {
            return Err(PhysicsSetupError::ChildHasBody { object: id, child });
        }

        let owner = BodyOwner::Object(id);
        let mut desc = if mass == 0.0 {
            RigidBodyDesc::fixed(object.position, owner)
        } else {
            RigidBodyDesc::dynamic(object.position, mass, owner)
        };
        desc.rotation = object.orientation;
        let body = physics.add_body(desc);
        let Some(collider) = physics.add_collider(ColliderDesc::attached(body, shape)) else {
            physics.remove_body(body);
            return Err(PhysicsSetupError::ColliderRejected(id));
        };

        if let Some(object) = self.objects.get_mut(&id) {
            object.body = Some(body);
            object.collider = Some(collider);
            object.mass = mass;
        }
        log::debug!("Object {id} got body {body:?} (mass {mass}).");
        Ok(body)
    }

    /// Moves an object. A physical object is teleported and stopped.
    pub fn set_transform(
        &mut self,
        id: ObjectId,
        position: Vec3,
        orientation: Quat,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PhysicsSetupError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(PhysicsSetupError::UnknownObject(id))?;
        object.position = position;
        object.orientation = orientation;
        if let Some(body) = object.body {
            physics.set_body_transform(body, position, orientation);
            physics.set_linear_velocity(body, Vec3::ZERO);
            physics.set_angular_velocity(body, Vec3::ZERO);
        }
        Ok(())
    }

    /// Removes an object and its body. Its children are detached, not destroyed.
    pub fn destroy_object(
        &mut self,
        id: ObjectId,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<(), PhysicsSetupError> {
        self.detach(id)?;
        let object = self
            .objects
            .remove(&id)
            .ok_or(PhysicsSetupError::UnknownObject(id))?;
        for child in &object.children {
            if let Some(child) = self.objects.get_mut(child) {
                child.parent = None;
            }
        }
        if self.names.get(&object.name) == Some(&id) {
            self.names.remove(&object.name);
        }
        if let Some(body) = object.body {
            physics.remove_body(body);
        }
        log::debug!("Destroyed object {id} '{}'.", object.name);
        Ok(())
    }

    /// Removes every object and trigger.
    pub fn clear(&mut self, physics: &mut dyn PhysicsProvider) {
        for object in std::mem::take(&mut self.objects).into_values() {
            if let Some(body) = object.body {
                physics.remove_body(body);
            }
        }
        for trigger in std::mem::take(&mut self.triggers).into_values() {
            physics.remove_collider(trigger.collider);
        }
        self.names.clear();
    }

    /// Creates a sensor volume.
    pub fn create_trigger(
        &mut self,
        shape: ColliderShape,
        position: Vec3,
        physics: &mut dyn PhysicsProvider,
    ) -> Result<TriggerId, PhysicsSetupError> {
        let id = TriggerId(self.next_trigger);
        let collider = physics
            .add_collider(ColliderDesc::sensor(position, shape, BodyOwner::Trigger(id)))
            .ok_or(PhysicsSetupError::TriggerRejected(id))?;
        self.next_trigger += 1;
        self.triggers.insert(
            id,
            TriggerObject {
                id,
                shape,
                position,
                collider,
            },
        );
        log::debug!("Created trigger {id} at {position:?}.");
        Ok(id)
    }

    /// Looks a trigger up.
    pub fn trigger(&self, id: TriggerId) -> Option<&TriggerObject> {
        self.triggers.get(&id)
    }

    /// Number of triggers.
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Removes a trigger. Returns `false` if it did not exist.
    pub fn destroy_trigger(&mut self, id: TriggerId, physics: &mut dyn PhysicsProvider) -> bool {
        match self.triggers.remove(&id) {
            Some(trigger) => {
                physics.remove_collider(trigger.collider);
                true
            }
            None => false,
        }
    }

    /// Reads back the transform of every physical object.
    pub fn update(&mut self, physics: &dyn PhysicsProvider) {
        for object in self.objects.values_mut() {
            let Some(body) = object.body else {
                continue;
            };
            match physics.body_transform(body) {
                Some((position, orientation)) => {
                    object.position = position;
                    object.orientation = orientation;
                }
                None => log::warn!("Body of object {} vanished from the physics world.", object.id),
            }
        }
    }
}
