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

//! Collects sensor transitions raised while the pipeline steps.

use rapier3d::prelude::*;

/// A raw sensor transition, resolved into engine owners after the step.
#[derive(Debug, Clone, Copy)]
pub struct SensorTransition {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    pub started: bool,
}

/// Event handler handed to the physics pipeline.
///
/// Rapier calls it from inside `step`, possibly several times per substep, so
/// transitions are only queued here.
pub struct RapierEventHandler {
    sender: flume::Sender<SensorTransition>,
}

impl RapierEventHandler {
    pub fn new() -> (Self, flume::Receiver<SensorTransition>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventHandler for RapierEventHandler {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let transition = match event {
            CollisionEvent::Started(h1, h2, flags) if flags.contains(CollisionEventFlags::SENSOR) => {
                SensorTransition {
                    collider1: h1,
                    collider2: h2,
                    started: true,
                }
            }
            CollisionEvent::Stopped(h1, h2, flags) if flags.contains(CollisionEventFlags::SENSOR) => {
                SensorTransition {
                    collider1: h1,
                    collider2: h2,
                    started: false,
                }
            }
            // Solid contacts are read from the narrow phase after the step.
            _ => return,
        };
        // The receiver lives in the same world as this handler.
        let _ = self.sender.send(transition);
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
