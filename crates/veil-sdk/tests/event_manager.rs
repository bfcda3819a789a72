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

//! Integration tests for event dispatch: timers, listener lifetime, input edges.

use std::cell::RefCell;
use std::rc::Rc;

use veil_core::event::{Event, KeyEvent, TimeEvent, TimerId, UserEvent};
use veil_core::input::{DeviceState, InputDevice, KeyCode, KeyboardState};
use veil_infra::RapierPhysicsWorld;
use veil_sdk::events::{DefaultEventListener, EventContext, EventError, EventListener, EventManager};
use veil_sdk::player::{PlayerBody, WalkDirection};

const DT: f32 = 1.0 / 60.0;

/// Owns what `EventManager::update` borrows.
struct Harness {
    events: EventManager,
    player: PlayerBody,
    physics: RapierPhysicsWorld,
}

impl Harness {
    fn new() -> Self {
        Self {
            events: EventManager::default(),
            player: PlayerBody::default(),
            physics: RapierPhysicsWorld::default(),
        }
    }

    fn update(&mut self) -> veil_sdk::FrameEvents {
        self.events.update(DT, &mut self.player, &mut self.physics)
    }
}

/// Records every event it receives, with the event clock at delivery.
#[derive(Default)]
struct Recorder {
    events: Vec<(f64, Event)>,
    ticks: usize,
}

impl Recorder {
    fn timers(&self) -> Vec<(f64, TimerId)> {
        self.events
            .iter()
            .filter_map(|(now, event)| match event {
                Event::Time(TimeEvent { id }) => Some((*now, *id)),
                _ => None,
            })
            .collect()
    }

    fn keys(&self) -> Vec<KeyEvent> {
        self.events
            .iter()
            .filter_map(|(_, event)| match event {
                Event::Key(key) => Some(*key),
                _ => None,
            })
            .collect()
    }
}

impl EventListener for Recorder {
    fn key_event(&mut self, event: &KeyEvent, ctx: &mut EventContext<'_>) {
        self.events.push((ctx.now(), Event::Key(*event)));
    }

    fn time_event(&mut self, event: &TimeEvent, ctx: &mut EventContext<'_>) {
        self.events.push((ctx.now(), Event::Time(*event)));
    }

    fn tick(&mut self, _ctx: &mut EventContext<'_>) {
        self.ticks += 1;
    }
}

/// A keyboard whose state the test sets directly.
#[derive(Clone, Default)]
struct FakeKeyboard(Rc<RefCell<KeyboardState>>);

impl FakeKeyboard {
    fn set(&self, key: KeyCode, down: bool) {
        self.0.borrow_mut().set(key, down);
    }
}

impl InputDevice for FakeKeyboard {
    fn name(&self) -> &str {
        "fake keyboard"
    }

    fn poll(&mut self) -> DeviceState {
        DeviceState::Keyboard(self.0.borrow().clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Timers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_two_timers_fire_once_in_due_order() {
    let mut harness = Harness::new();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&recorder).expect("register");

    let short = harness.events.fire_timer(1.0);
    let long = harness.events.fire_timer(2.5);
    assert_ne!(short, long);

    for _ in 0..180 {
        harness.update();
    }

    let fired = recorder.borrow().timers();
    assert_eq!(fired.len(), 2, "each timer fires exactly once: {fired:?}");
    assert_eq!(fired[0].1, short);
    assert_eq!(fired[1].1, long);
    assert!(fired[0].0 >= 1.0 && fired[0].0 < 1.0 + 2.0 * f64::from(DT));
    assert!(fired[1].0 >= 2.5 && fired[1].0 < 2.5 + 2.0 * f64::from(DT));
    assert_eq!(harness.events.active_timer_count(), 0);
    assert_eq!(harness.events.pending_timer_count(), 0);
}

#[test]
fn test_timer_fired_from_a_listener_waits_for_the_next_frame() {
    /// Fires a zero-delay timer on its first tick.
    #[derive(Default)]
    struct Rearming {
        armed: Option<(u64, TimerId)>,
        fired: Vec<(u64, TimerId)>,
    }

    impl EventListener for Rearming {
        fn time_event(&mut self, event: &TimeEvent, ctx: &mut EventContext<'_>) {
            self.fired.push((ctx.snapshot(), event.id));
        }

        fn tick(&mut self, ctx: &mut EventContext<'_>) {
            if self.armed.is_none() {
                self.armed = Some((ctx.snapshot(), ctx.fire_timer(0.0)));
            }
        }
    }

    let mut harness = Harness::new();
    let listener = Rc::new(RefCell::new(Rearming::default()));
    harness.events.add_listener(&listener).expect("register");

    let first = harness.update();
    assert_eq!(first.timers_fired, 0);
    assert_eq!(harness.events.pending_timer_count(), 1);

    let second = harness.update();
    assert_eq!(second.timers_fired, 1);

    let listener = listener.borrow();
    let (armed_at, id) = listener.armed.expect("armed on first tick");
    assert_eq!(armed_at, 1);
    assert_eq!(listener.fired, vec![(2, id)]);
}

#[test]
fn test_timer_fired_from_a_key_event_waits_for_the_next_frame() {
    /// Fires a zero-delay timer on the first key press.
    #[derive(Default)]
    struct KeyArmed {
        armed: Vec<(u64, TimerId)>,
        fired: Vec<(u64, TimerId)>,
    }

    impl EventListener for KeyArmed {
        fn key_event(&mut self, event: &KeyEvent, ctx: &mut EventContext<'_>) {
            if event.is_pressed() {
                self.armed.push((ctx.snapshot(), ctx.fire_timer(0.0)));
            }
        }

        fn time_event(&mut self, event: &TimeEvent, ctx: &mut EventContext<'_>) {
            self.fired.push((ctx.snapshot(), event.id));
        }
    }

    let mut harness = Harness::new();
    let keyboard = FakeKeyboard::default();
    harness.events.add_input_device(Box::new(keyboard.clone()));
    let listener = Rc::new(RefCell::new(KeyArmed::default()));
    harness.events.add_listener(&listener).expect("register");

    keyboard.set(KeyCode::Space, true);
    let first = harness.update();
    assert_eq!(first.timers_fired, 0, "a timer armed during capture dispatch must not fire");
    assert_eq!(harness.events.active_timer_count(), 0);

    let second = harness.update();
    assert_eq!(second.timers_fired, 1);

    let listener = listener.borrow();
    let id = listener.armed[0].1;
    assert_eq!(listener.armed, vec![(1, id)]);
    assert_eq!(listener.fired, vec![(2, id)]);
}

#[test]
fn test_millisecond_timer_matches_seconds() {
    let mut harness = Harness::new();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&recorder).expect("register");

    let id = harness.events.fire_timer_millisec(100);
    for _ in 0..5 {
        harness.update();
    }
    assert!(recorder.borrow().timers().is_empty(), "0.083s is too early");
    for _ in 0..2 {
        harness.update();
    }
    let fired = recorder.borrow().timers();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].1, id);
}

// ─────────────────────────────────────────────────────────────────────────────
// User events
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_user_event_from_a_listener_is_delivered_next_update() {
    struct Ping;

    /// Answers every `Ping` it sees with a `String`, and counts both.
    #[derive(Default)]
    struct Echo {
        pings: Vec<u64>,
        replies: Vec<(u64, String)>,
    }

    impl EventListener for Echo {
        fn user_event(&mut self, event: &UserEvent, ctx: &mut EventContext<'_>) {
            if event.is::<Ping>() {
                self.pings.push(ctx.snapshot());
                ctx.dispatch_user_event(UserEvent::new(String::from("pong")));
            } else if let Some(reply) = event.downcast_ref::<String>() {
                self.replies.push((ctx.snapshot(), reply.clone()));
            }
        }
    }

    let mut harness = Harness::new();
    let echo = Rc::new(RefCell::new(Echo::default()));
    harness.events.add_listener(&echo).expect("register");

    harness.events.dispatch_user_event(UserEvent::new(Ping));
    assert_eq!(harness.events.pending_user_event_count(), 1);

    let first = harness.update();
    assert_eq!(first.user_events, 1);
    assert_eq!(harness.events.pending_user_event_count(), 1, "the reply waits");

    let second = harness.update();
    assert_eq!(second.user_events, 1);
    let third = harness.update();
    assert_eq!(third.user_events, 0);

    let echo = echo.borrow();
    assert_eq!(echo.pings, vec![1]);
    assert_eq!(echo.replies, vec![(2, "pong".to_owned())]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Listener lifetime
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_dropped_listener_is_pruned_without_crashing() {
    let mut harness = Harness::new();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&recorder).expect("register");
    assert_eq!(harness.events.listener_count(), 1);

    drop(recorder);
    for _ in 0..10 {
        let frame = harness.update();
        assert_eq!(frame.listeners, 0);
    }
    assert_eq!(harness.events.listener_count(), 0);
}

#[test]
fn test_surviving_listener_keeps_receiving_events() {
    let mut harness = Harness::new();
    let gone = Rc::new(RefCell::new(Recorder::default()));
    let kept = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&gone).expect("register");
    harness.events.add_listener(&kept).expect("register");

    harness.update();
    drop(gone);
    harness.events.fire_timer(0.0);
    harness.update();
    harness.update();

    assert_eq!(kept.borrow().ticks, 3);
    assert_eq!(kept.borrow().timers().len(), 1);
    assert_eq!(harness.events.listener_count(), 1);
}

#[test]
fn test_panicking_listener_does_not_stop_dispatch() {
    struct Panicky;

    impl EventListener for Panicky {
        fn tick(&mut self, _ctx: &mut EventContext<'_>) {
            panic!("listener failure");
        }
    }

    let mut harness = Harness::new();
    let bad = Rc::new(RefCell::new(Panicky));
    let good = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&bad).expect("register");
    harness.events.add_listener(&good).expect("register");

    for _ in 0..3 {
        harness.update();
    }
    assert_eq!(good.borrow().ticks, 3);
    assert_eq!(harness.events.listener_count(), 2);
}

#[test]
fn test_registry_rejects_duplicates_and_stale_handles() {
    let mut harness = Harness::new();
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let handle = harness.events.add_listener(&recorder).expect("register");

    assert_eq!(
        harness.events.add_listener(&recorder),
        Err(EventError::DuplicateListener)
    );
    harness.events.remove_listener(handle).expect("remove");
    assert_eq!(
        harness.events.remove_listener(handle),
        Err(EventError::UnknownListener(handle))
    );

    // The freed slot is reused under a new generation.
    let again = harness.events.add_listener(&recorder).expect("register");
    assert_ne!(again, handle);
    harness.update();
    assert_eq!(recorder.borrow().ticks, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Input capture
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_key_events_are_edges_only() {
    let mut harness = Harness::new();
    let keyboard = FakeKeyboard::default();
    harness.events.add_input_device(Box::new(keyboard.clone()));
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&recorder).expect("register");

    keyboard.set(KeyCode::W, true);
    harness.update();
    harness.update();
    keyboard.set(KeyCode::W, false);
    harness.update();

    let keys = recorder.borrow().keys();
    assert_eq!(keys.len(), 2, "held keys must not repeat: {keys:?}");
    assert!(keys[0].is_pressed() && keys[0].key == KeyCode::W);
    assert_eq!(keys[0].snapshot, 1);
    assert!(keys[1].is_released());
    assert_eq!(keys[1].snapshot, 3);
}

#[test]
fn test_ignored_keyboard_marks_events() {
    let mut harness = Harness::new();
    let keyboard = FakeKeyboard::default();
    harness.events.add_input_device(Box::new(keyboard.clone()));
    let listener = Rc::new(RefCell::new(DefaultEventListener::new()));
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    harness.events.add_listener(&listener).expect("register");
    harness.events.add_listener(&recorder).expect("register");

    harness.events.set_keyboard_ignore(true);
    keyboard.set(KeyCode::W, true);
    harness.update();

    assert!(recorder.borrow().keys()[0].should_ignore());
    assert!(!harness.player.is_walking(WalkDirection::Forward));
}

#[test]
fn test_default_listener_drives_the_player() {
    let mut harness = Harness::new();
    let keyboard = FakeKeyboard::default();
    harness.events.add_input_device(Box::new(keyboard.clone()));
    let listener = Rc::new(RefCell::new(DefaultEventListener::new()));
    harness.events.add_listener(&listener).expect("register");

    keyboard.set(KeyCode::W, true);
    keyboard.set(KeyCode::ShiftLeft, true);
    harness.update();
    assert!(harness.player.is_walking(WalkDirection::Forward));
    assert!(harness.player.is_running());

    keyboard.set(KeyCode::W, false);
    keyboard.set(KeyCode::F12, true);
    harness.update();
    assert!(!harness.player.is_walking(WalkDirection::Forward));
    assert!(harness.events.take_recenter_request());
    assert!(!harness.events.take_recenter_request(), "the request is consumed");
}
