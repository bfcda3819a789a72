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

//! # Event Manager
//!
//! Turns device state, timers and physics notifications into typed events and
//! delivers them to listeners once per frame. [`EventManager::update`] runs
//! these phases, always in this order:
//!
//! 1. **Capture**: poll every input device and build key/button edges and the
//!    per-frame mouse, controller and hand controller states.
//! 2. **Timer promotion**: timers created during the previous update become
//!    active. This happens before any listener runs, so a timer armed while
//!    handling this frame's input is staged for the next frame.
//! 3. **Input dispatch and timer expiry**: the captured events are delivered,
//!    then each due timer fires one [`TimeEvent`] and is dropped.
//! 4. **Physics flush**: buffered trigger and contact notifications become
//!    trigger, collision and player collision events. User events queued
//!    since the previous update follow.
//! 5. **Tick**: every listener's `tick` runs once.
//!
//! Listeners are held weakly. A listener dropped without being removed is
//! skipped and pruned; that is not an error.

mod default_listener;
mod listener;
mod timer;

pub use self::default_listener::{DefaultEventListener, KeyBindings, StickBindings};
pub use self::listener::{EventContext, EventListener};

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use thiserror::Error;
use veil_core::event::{
    CollisionEvent, ControllerEvent, ControllerId, Event, EventBus, HandControllerEvent, KeyEvent,
    MouseEvent, PlayerCollisionEvent, TimeEvent, TimerId, TriggerEvent, UserEvent,
};
use veil_core::input::{DeviceState, InputDevice, KeyCode, MouseButton};
use veil_core::physics::{BodyOwner, ContactReport, PhysicsNotification, PhysicsProvider};
use veil_core::pose::{HandControllerState, HandSide};

use self::timer::TimerQueue;
use crate::config::InputConfig;
use crate::player::PlayerBody;

/// Stable handle to a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    index: u32,
    generation: u32,
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}v{}", self.index, self.generation)
    }
}

/// Misuse of the listener registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// The listener is already registered.
    #[error("listener is already registered")]
    DuplicateListener,
    /// The handle does not refer to a registered listener.
    #[error("{0} is not registered")]
    UnknownListener(ListenerHandle),
}

struct ListenerSlot {
    generation: u32,
    entry: Option<ListenerEntry>,
}

struct ListenerEntry {
    listener: Weak<RefCell<dyn EventListener>>,
    address: usize,
}

/// Counts of what one [`EventManager::update`] delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEvents {
    /// Snapshot number of the frame.
    pub snapshot: u64,
    /// Typed events delivered, excluding ticks.
    pub delivered: usize,
    /// Timers that fired.
    pub timers_fired: usize,
    /// Trigger, collision and player collision events.
    pub physics_events: usize,
    /// User events.
    pub user_events: usize,
    /// Live listeners after pruning.
    pub listeners: usize,
}

/// Polls devices, buffers timers and physics notifications, and dispatches to listeners.
pub struct EventManager {
    slots: Vec<ListenerSlot>,
    free: Vec<u32>,

    devices: Vec<Box<dyn InputDevice>>,
    previous: Vec<Option<DeviceState>>,
    keyboard_ignore: bool,
    hands: Vec<HandControllerState>,
    previous_hand_buttons: HashMap<HandSide, Vec<bool>>,

    timers: TimerQueue,
    physics_bus: EventBus<PhysicsNotification>,
    user_events: Vec<UserEvent>,

    config: InputConfig,
    now: f64,
    snapshot: u64,
    recenter_requested: bool,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listener_count())
            .field("devices", &self.devices.len())
            .field("timers", &self.timers.len())
            .field("now", &self.now)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

fn address_of<T: ?Sized>(rc: &Rc<RefCell<T>>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

/// Button edges between two frames.
fn edges(previous: &[bool], current: &[bool]) -> (Vec<usize>, Vec<usize>) {
    let mut pressed = Vec::new();
    let mut released = Vec::new();
    for (i, &down) in current.iter().enumerate() {
        let was_down = previous.get(i).copied().unwrap_or(false);
        match (was_down, down) {
            (false, true) => pressed.push(i),
            (true, false) => released.push(i),
            _ => {}
        }
    }
    (pressed, released)
}

impl EventManager {
    /// Creates a manager with no listener and no device.
    pub fn new(config: InputConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            devices: Vec::new(),
            previous: Vec::new(),
            keyboard_ignore: false,
            hands: Vec::new(),
            previous_hand_buttons: HashMap::new(),
            timers: TimerQueue::default(),
            physics_bus: EventBus::new(),
            user_events: Vec::new(),
            config,
            now: 0.0,
            snapshot: 0,
            recenter_requested: false,
        }
    }

    // --- Listeners ---

    /// Registers a listener. The manager keeps only a weak reference.
    pub fn add_listener<L: EventListener + 'static>(
        &mut self,
        listener: &Rc<RefCell<L>>,
    ) -> Result<ListenerHandle, EventError> {
        let address = address_of(listener);
        let duplicate = self.slots.iter().filter_map(|slot| slot.entry.as_ref()).any(|entry| {
            entry.address == address && entry.listener.strong_count() > 0
        });
        if duplicate {
            return Err(EventError::DuplicateListener);
        }

        let strong: Rc<RefCell<dyn EventListener>> = listener.clone();
        let entry = ListenerEntry {
            listener: Rc::downgrade(&strong),
            address,
        };
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(ListenerSlot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.entry = Some(entry);
        let handle = ListenerHandle {
            index,
            generation: slot.generation,
        };
        log::debug!("Registered {handle}.");
        Ok(handle)
    }

    /// Unregisters a listener.
    pub fn remove_listener(&mut self, handle: ListenerHandle) -> Result<(), EventError> {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.entry.is_some() => {
                Self::release(slot);
                self.free.push(handle.index);
                log::debug!("Removed {handle}.");
                Ok(())
            }
            _ => Err(EventError::UnknownListener(handle)),
        }
    }

    /// Unregisters every listener.
    pub fn clear_listeners(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_some() {
                Self::release(slot);
                self.free.push(index as u32);
            }
        }
        log::debug!("Cleared all listeners.");
    }

    fn release(slot: &mut ListenerSlot) {
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
    }

    /// Number of registered listeners, including dropped ones not yet pruned.
    pub fn listener_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    fn prune_dead_listeners(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let dead = slot
                .entry
                .as_ref()
                .is_some_and(|entry| entry.listener.strong_count() == 0);
            if dead {
                log::trace!("Pruning dropped listener in slot {index}.");
                Self::release(slot);
                self.free.push(index as u32);
            }
        }
    }

    // --- Inputs ---

    /// Adds a device polled during capture. Controllers are numbered in registration order.
    pub fn add_input_device(&mut self, device: Box<dyn InputDevice>) {
        log::info!("Input device registered: {}.", device.name());
        self.devices.push(device);
        self.previous.push(None);
    }

    /// Number of registered input devices.
    pub fn input_device_count(&self) -> usize {
        self.devices.len()
    }

    /// Marks key events as to be ignored by gameplay, for text capture.
    pub fn set_keyboard_ignore(&mut self, ignore: bool) {
        self.keyboard_ignore = ignore;
    }

    /// Whether key events are marked as ignored.
    pub fn keyboard_ignored(&self) -> bool {
        self.keyboard_ignore
    }

    /// Tracked hand controllers for the next capture.
    pub fn set_hand_controllers(&mut self, hands: Vec<HandControllerState>) {
        self.hands = hands;
    }

    // --- Timers ---

    /// Starts a one-shot timer firing `delay` seconds from now, at the earliest next update.
    pub fn fire_timer(&mut self, delay: f64) -> TimerId {
        self.timers.schedule(self.now, delay)
    }

    /// [`EventManager::fire_timer`] with a delay in milliseconds.
    pub fn fire_timer_millisec(&mut self, delay_ms: u64) -> TimerId {
        self.fire_timer(delay_ms as f64 / 1000.0)
    }

    /// Timers not fired yet, staged or active.
    pub fn pending_timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Timers already promoted to the active list.
    pub fn active_timer_count(&self) -> usize {
        self.timers.active_len()
    }

    // --- Physics ---

    /// Sender the physics world pushes its notifications into.
    pub fn physics_sender(&self) -> flume::Sender<PhysicsNotification> {
        self.physics_bus.sender()
    }

    /// Notifications waiting for the next flush.
    pub fn pending_physics_notifications(&self) -> usize {
        self.physics_bus.len()
    }

    // --- User events ---

    /// Queues a user event for every listener, delivered during the next update.
    ///
    /// Subsystems raise their events through here; listeners use
    /// [`EventContext::dispatch_user_event`].
    pub fn dispatch_user_event(&mut self, event: UserEvent) {
        log::trace!(
            "User event {} queued by {}.",
            event.type_name(),
            event.origin().unwrap_or("the application")
        );
        self.user_events.push(event);
    }

    /// User events waiting for the next update.
    pub fn pending_user_event_count(&self) -> usize {
        self.user_events.len()
    }

    // --- Clock ---

    /// Event clock, in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Snapshot number of the last update.
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    /// Returns and clears a recenter request made by a listener.
    pub fn take_recenter_request(&mut self) -> bool {
        std::mem::take(&mut self.recenter_requested)
    }

    // --- Update ---

    /// Runs one frame of capture and dispatch. Never fails: a panicking
    /// listener is logged and skipped.
    pub fn update(
        &mut self,
        dt: f32,
        player: &mut PlayerBody,
        physics: &mut dyn PhysicsProvider,
    ) -> FrameEvents {
        self.now += f64::from(dt.max(0.0));
        self.snapshot += 1;
        self.prune_dead_listeners();

        let captured = self.capture();
        // Only timers staged before this update are eligible; anything a
        // listener arms from here on waits for the next frame.
        self.timers.promote();
        let user_events = std::mem::take(&mut self.user_events);

        let mut summary = FrameEvents {
            snapshot: self.snapshot,
            listeners: self.listener_count(),
            ..FrameEvents::default()
        };
        let mut dispatcher = Dispatcher {
            slots: &self.slots,
            ctx: EventContext {
                now: self.now,
                dt,
                snapshot: self.snapshot,
                deadzone: self.config.stick_deadzone,
                timers: &mut self.timers,
                recenter_requested: &mut self.recenter_requested,
                user_events: &mut self.user_events,
                player,
                physics,
            },
        };

        for event in &captured {
            dispatcher.dispatch(event);
        }
        summary.delivered += captured.len();

        let expired = dispatcher.ctx.timers.take_expired(dispatcher.ctx.now);
        for id in &expired {
            log::trace!("Timer {id:?} fired at t = {:.4}.", dispatcher.ctx.now);
            dispatcher.dispatch(&Event::Time(TimeEvent { id: *id }));
        }
        summary.timers_fired = expired.len();
        summary.delivered += expired.len();

        dispatcher.ctx.player.set_contact_with_ground(false);
        for notification in self.physics_bus.drain() {
            let Some(event) = to_event(notification) else {
                continue;
            };
            if let Event::PlayerCollision(collision) = &event {
                if collision.is_ground() {
                    dispatcher.ctx.player.set_contact_with_ground(true);
                }
            }
            dispatcher.dispatch(&event);
            summary.physics_events += 1;
        }
        summary.delivered += summary.physics_events;

        for event in user_events {
            dispatcher.dispatch(&Event::User(event));
            summary.user_events += 1;
        }
        summary.delivered += summary.user_events;

        dispatcher.tick();
        summary
    }

    fn capture(&mut self) -> Vec<Event> {
        let snapshot = self.snapshot;
        let mut events = Vec::new();
        let mut controller_index = 0;

        for (device, previous) in self.devices.iter_mut().zip(self.previous.iter_mut()) {
            let state = device.poll();
            match (&state, previous.as_ref()) {
                (DeviceState::Keyboard(keys), last) => {
                    for &key in KeyCode::ALL {
                        let was_down = match last {
                            Some(DeviceState::Keyboard(last)) => last.is_down(key),
                            _ => false,
                        };
                        let down = keys.is_down(key);
                        if down != was_down {
                            events.push(Event::Key(KeyEvent {
                                key,
                                pressed: down,
                                ignored: self.keyboard_ignore,
                                snapshot,
                            }));
                        }
                    }
                }
                (DeviceState::Mouse(mouse), last) => {
                    let last_buttons = match last {
                        Some(DeviceState::Mouse(last)) => last.buttons,
                        _ => [false; MouseButton::COUNT],
                    };
                    let (pressed, released) = edges(&last_buttons, &mouse.buttons);
                    events.push(Event::Mouse(MouseEvent {
                        axes: mouse.axes,
                        buttons: mouse.buttons,
                        pressed: pressed.into_iter().map(|i| MouseButton::ALL[i]).collect(),
                        released: released.into_iter().map(|i| MouseButton::ALL[i]).collect(),
                        snapshot,
                    }));
                }
                (DeviceState::Controller(controller), last) => {
                    let last_buttons: &[bool] = match last {
                        Some(DeviceState::Controller(last)) => &last.buttons,
                        _ => &[],
                    };
                    let (pressed, released) = edges(last_buttons, &controller.buttons);
                    events.push(Event::Controller(ControllerEvent {
                        controller: ControllerId(controller_index),
                        vendor: controller.vendor.clone(),
                        axes: controller.axes.clone(),
                        buttons: controller.buttons.clone(),
                        pressed,
                        released,
                        povs: controller.povs.clone(),
                        xbox_layout: controller.xbox_layout,
                        snapshot,
                    }));
                    controller_index += 1;
                }
            }
            *previous = Some(state);
        }

        for hand in std::mem::take(&mut self.hands) {
            let last = self
                .previous_hand_buttons
                .insert(hand.side, hand.buttons.clone())
                .unwrap_or_default();
            let (pressed, released) = edges(&last, &hand.buttons);
            events.push(Event::HandController(HandControllerEvent {
                state: hand,
                pressed,
                released,
            }));
        }
        events
    }
}

/// Maps a physics notification to the event listeners see.
fn to_event(notification: PhysicsNotification) -> Option<Event> {
    match notification {
        PhysicsNotification::Trigger(report) => Some(Event::Trigger(TriggerEvent {
            trigger: report.trigger,
            other: report.other,
            contact: report.contact,
        })),
        PhysicsNotification::Contact(ContactReport {
            a,
            b,
            position,
            normal,
        }) => match (a, b) {
            (BodyOwner::Object(a), BodyOwner::Object(b)) => Some(Event::Collision(CollisionEvent {
                a,
                b,
                position,
                normal,
            })),
            // The reported normal points from `b` towards `a`.
            (BodyOwner::Player, BodyOwner::Object(object)) => {
                Some(Event::PlayerCollision(PlayerCollisionEvent {
                    object,
                    position,
                    normal,
                }))
            }
            (BodyOwner::Object(object), BodyOwner::Player) => {
                Some(Event::PlayerCollision(PlayerCollisionEvent {
                    object,
                    position,
                    normal: -normal,
                }))
            }
            _ => {
                log::trace!("Contact between {a:?} and {b:?} has no listener-facing event.");
                None
            }
        },
    }
}

struct Dispatcher<'s, 'c> {
    slots: &'s [ListenerSlot],
    ctx: EventContext<'c>,
}

impl Dispatcher<'_, '_> {
    fn dispatch(&mut self, event: &Event) {
        self.each_listener(|listener, ctx| match event {
            Event::Key(e) => listener.key_event(e, ctx),
            Event::Mouse(e) => listener.mouse_event(e, ctx),
            Event::Controller(e) => listener.controller_event(e, ctx),
            Event::Time(e) => listener.time_event(e, ctx),
            Event::Trigger(e) => listener.trigger_event(e, ctx),
            Event::HandController(e) => listener.hand_controller_event(e, ctx),
            Event::Collision(e) => listener.collision_event(e, ctx),
            Event::PlayerCollision(e) => listener.player_collision_event(e, ctx),
            Event::User(e) => listener.user_event(e, ctx),
        });
    }

    fn tick(&mut self) {
        self.each_listener(|listener, ctx| listener.tick(ctx));
    }

    fn each_listener(&mut self, mut f: impl FnMut(&mut dyn EventListener, &mut EventContext<'_>)) {
        for entry in self.slots.iter().filter_map(|slot| slot.entry.as_ref()) {
            // A listener dropped without being removed is simply skipped.
            let Some(listener) = entry.listener.upgrade() else {
                continue;
            };
            let Ok(mut guard) = listener.try_borrow_mut() else {
                log::warn!("Listener busy (already borrowed), event skipped.");
                continue;
            };
            let ctx = &mut self.ctx;
            let result = panic::catch_unwind(AssertUnwindSafe(|| f(&mut *guard, ctx)));
            if result.is_err() {
                log::error!("Event listener panicked; continuing with the remaining listeners.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::physics::{ObjectId, TriggerId};
    use veil_core::math::Vec3;

    #[derive(Default)]
    struct Counter {
        ticks: usize,
    }

    impl EventListener for Counter {
        fn tick(&mut self, _ctx: &mut EventContext<'_>) {
            self.ticks += 1;
        }
    }

    #[test]
    fn test_handles_are_generational() {
        let mut manager = EventManager::default();
        let listener = Rc::new(RefCell::new(Counter::default()));
        let first = manager.add_listener(&listener).expect("first add");
        manager.remove_listener(first).expect("remove");
        assert_eq!(
            manager.remove_listener(first),
            Err(EventError::UnknownListener(first))
        );

        let second = manager.add_listener(&listener).expect("re-add");
        assert_ne!(first, second, "a reused slot gets a new generation");
        assert_eq!(manager.listener_count(), 1);
    }

    #[test]
    fn test_duplicate_listener_is_rejected() {
        let mut manager = EventManager::default();
        let listener = Rc::new(RefCell::new(Counter::default()));
        manager.add_listener(&listener).expect("first add");
        assert_eq!(
            manager.add_listener(&listener),
            Err(EventError::DuplicateListener)
        );
    }

    #[test]
    fn test_clear_listeners() {
        let mut manager = EventManager::default();
        let a = Rc::new(RefCell::new(Counter::default()));
        let b = Rc::new(RefCell::new(Counter::default()));
        let handle = manager.add_listener(&a).expect("add a");
        manager.add_listener(&b).expect("add b");
        manager.clear_listeners();
        assert_eq!(manager.listener_count(), 0);
        assert!(manager.remove_listener(handle).is_err());
    }

    #[test]
    fn test_button_edges() {
        let (pressed, released) = edges(&[true, false, true], &[true, true, false, true]);
        assert_eq!(pressed, vec![1, 3]);
        assert_eq!(released, vec![2]);
    }

    #[test]
    fn test_contact_mapping() {
        let object_pair = to_event(PhysicsNotification::Contact(ContactReport {
            a: BodyOwner::Object(ObjectId(1)),
            b: BodyOwner::Object(ObjectId(2)),
            position: Vec3::ZERO,
            normal: Vec3::Y,
        }));
        assert!(matches!(object_pair, Some(Event::Collision(c)) if c.a == ObjectId(1) && c.b == ObjectId(2)));

        // Player second: the normal on the player points at the object, flip it.
        let player_second = to_event(PhysicsNotification::Contact(ContactReport {
            a: BodyOwner::Object(ObjectId(3)),
            b: BodyOwner::Player,
            position: Vec3::ZERO,
            normal: -Vec3::Y,
        }));
        match player_second {
            Some(Event::PlayerCollision(c)) => {
                assert_eq!(c.object, ObjectId(3));
                assert_eq!(c.normal, Vec3::Y);
                assert!(c.is_ground());
            }
            other => panic!("unexpected {other:?}"),
        }

        let untagged = to_event(PhysicsNotification::Contact(ContactReport {
            a: BodyOwner::Untagged,
            b: BodyOwner::Player,
            position: Vec3::ZERO,
            normal: Vec3::Y,
        }));
        assert!(untagged.is_none());
    }

    #[test]
    fn test_trigger_mapping() {
        let event = to_event(PhysicsNotification::Trigger(
            veil_core::physics::TriggerReport {
                trigger: TriggerId(5),
                other: BodyOwner::Player,
                contact: true,
            },
        ));
        assert!(matches!(event, Some(Event::Trigger(t)) if t.is_player() && t.contact));
    }
}
