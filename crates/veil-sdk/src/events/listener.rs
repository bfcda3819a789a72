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

//! The listener side of event dispatch.

use veil_core::event::{
    CollisionEvent, ControllerEvent, HandControllerEvent, KeyEvent, MouseEvent,
    PlayerCollisionEvent, TimeEvent, TimerId, TriggerEvent, UserEvent,
};
use veil_core::physics::PhysicsProvider;

use super::timer::TimerQueue;
use crate::player::PlayerBody;

/// Receives the events of a frame.
///
/// Every method has a no-op default. Typed events of a frame are delivered
/// before [`EventListener::tick`], which runs exactly once per frame. Delivery
/// order between listeners is unspecified.
#[allow(unused_variables)]
pub trait EventListener {
    /// A key went down or up.
    fn key_event(&mut self, event: &KeyEvent, ctx: &mut EventContext<'_>) {}

    /// The mouse state of this frame.
    fn mouse_event(&mut self, event: &MouseEvent, ctx: &mut EventContext<'_>) {}

    /// The state of a joystick or gamepad this frame.
    fn controller_event(&mut self, event: &ControllerEvent, ctx: &mut EventContext<'_>) {}

    /// A timer expired.
    fn time_event(&mut self, event: &TimeEvent, ctx: &mut EventContext<'_>) {}

    /// Something entered or left a trigger volume.
    fn trigger_event(&mut self, event: &TriggerEvent, ctx: &mut EventContext<'_>) {}

    /// A tracked hand controller.
    fn hand_controller_event(&mut self, event: &HandControllerEvent, ctx: &mut EventContext<'_>) {
    }

    /// Two game objects touched.
    fn collision_event(&mut self, event: &CollisionEvent, ctx: &mut EventContext<'_>) {}

    /// The player touched a game object.
    fn player_collision_event(&mut self, event: &PlayerCollisionEvent, ctx: &mut EventContext<'_>) {
    }

    /// An application-defined event raised during the previous frame.
    fn user_event(&mut self, event: &UserEvent, ctx: &mut EventContext<'_>) {}

    /// Per-frame update, after every typed event of the frame.
    fn tick(&mut self, ctx: &mut EventContext<'_>) {}
}

/// What a listener may touch while handling an event.
pub struct EventContext<'a> {
    pub(crate) now: f64,
    pub(crate) dt: f32,
    pub(crate) snapshot: u64,
    pub(crate) deadzone: f32,
    pub(crate) timers: &'a mut TimerQueue,
    pub(crate) recenter_requested: &'a mut bool,
    pub(crate) user_events: &'a mut Vec<UserEvent>,
    /// The player.
    pub player: &'a mut PlayerBody,
    /// The physics world.
    pub physics: &'a mut dyn PhysicsProvider,
}

impl EventContext<'_> {
    /// Event clock, in seconds since the manager was created.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Duration of the current frame.
    pub fn delta_time(&self) -> f32 {
        self.dt
    }

    /// Snapshot number of the current frame.
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    /// Configured analog dead-zone.
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Starts a one-shot timer firing `delay` seconds from now, at the earliest next frame.
    pub fn fire_timer(&mut self, delay: f64) -> TimerId {
        self.timers.schedule(self.now, delay)
    }

    /// [`EventContext::fire_timer`] with a delay in milliseconds.
    pub fn fire_timer_millisec(&mut self, delay_ms: u64) -> TimerId {
        self.fire_timer(delay_ms as f64 / 1000.0)
    }

    /// Queues a user event for every listener, delivered during the next update.
    pub fn dispatch_user_event(&mut self, event: UserEvent) {
        log::trace!("User event {} queued by a listener.", event.type_name());
        self.user_events.push(event);
    }

    /// Asks the pose source to re-zero its forward direction after this update.
    pub fn request_recenter(&mut self) {
        *self.recenter_requested = true;
    }
}
