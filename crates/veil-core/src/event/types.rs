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

//! Value types delivered to event listeners.
//!
//! Every event is an immutable snapshot built during the capture or flush phase
//! of a frame. Device events carry the `snapshot` number of the frame they were
//! captured in instead of a handle to the live device.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::input::{KeyCode, MouseAxis, MouseButton, PovDirection};
use crate::math::Vec3;
use crate::physics::{BodyOwner, ObjectId, TriggerId};
use crate::pose::{HandControllerState, HandSide};

/// Identifier of a one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Identifier of a polled controller, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub usize);

/// A key changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key.
    pub key: KeyCode,
    /// `true` on press, `false` on release.
    pub pressed: bool,
    /// Set while keyboard input is captured for text entry; gameplay should skip it.
    pub ignored: bool,
    /// Frame snapshot the transition was observed in.
    pub snapshot: u64,
}

impl KeyEvent {
    /// Whether the key went down.
    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Whether the key went up.
    #[inline]
    pub fn is_released(&self) -> bool {
        !self.pressed
    }

    /// Whether gameplay code should ignore this key.
    #[inline]
    pub fn should_ignore(&self) -> bool {
        self.ignored
    }
}

/// Mouse axes, as indices into [`MouseEvent::axes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAxisId {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
    /// Wheel.
    Z,
}

/// The mouse state of one frame, sent every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    /// X, Y and wheel axes.
    pub axes: [MouseAxis; 3],
    /// Held buttons, indexed by [`MouseButton::index`].
    pub buttons: [bool; MouseButton::COUNT],
    /// Buttons that went down this frame.
    pub pressed: Vec<MouseButton>,
    /// Buttons that went up this frame.
    pub released: Vec<MouseButton>,
    /// Frame snapshot.
    pub snapshot: u64,
}

impl MouseEvent {
    /// One axis of the mouse.
    #[inline]
    pub fn axis(&self, axis: MouseAxisId) -> MouseAxis {
        self.axes[axis as usize]
    }

    /// Whether `button` is held.
    #[inline]
    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons[button.index()]
    }
}

/// A joystick or gamepad state of one frame, sent every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerEvent {
    /// Which controller.
    pub controller: ControllerId,
    /// Vendor string.
    pub vendor: String,
    /// Raw axis values; dead-zone filtering is left to the consumer.
    pub axes: Vec<f32>,
    /// Held buttons.
    pub buttons: Vec<bool>,
    /// Buttons that went down this frame.
    pub pressed: Vec<usize>,
    /// Buttons that went up this frame.
    pub released: Vec<usize>,
    /// Point-of-view hats.
    pub povs: Vec<PovDirection>,
    /// Whether the buttons follow the Xbox layout.
    pub xbox_layout: bool,
    /// Frame snapshot.
    pub snapshot: u64,
}

impl ControllerEvent {
    /// Raw value of an axis, `0.0` if the controller has no such axis.
    #[inline]
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    /// Whether `button` went down this frame.
    pub fn was_pressed(&self, button: usize) -> bool {
        self.pressed.contains(&button)
    }

    /// Whether `button` went up this frame.
    pub fn was_released(&self, button: usize) -> bool {
        self.released.contains(&button)
    }
}

/// A timer expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEvent {
    /// The timer.
    pub id: TimerId,
}

/// Something entered or left a trigger volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    /// The trigger volume.
    pub trigger: TriggerId,
    /// What entered or left.
    pub other: BodyOwner,
    /// `true` on enter, `false` on leave.
    pub contact: bool,
}

impl TriggerEvent {
    /// Whether the player is the one that entered or left.
    #[inline]
    pub fn is_player(&self) -> bool {
        self.other == BodyOwner::Player
    }
}

/// A tracked hand controller, sent every frame it is tracked.
#[derive(Debug, Clone, PartialEq)]
pub struct HandControllerEvent {
    /// Full controller state.
    pub state: HandControllerState,
    /// Buttons that went down this frame.
    pub pressed: Vec<usize>,
    /// Buttons that went up this frame.
    pub released: Vec<usize>,
}

impl HandControllerEvent {
    /// Hand the controller is held in.
    #[inline]
    pub fn side(&self) -> HandSide {
        self.state.side
    }
}

/// Two game objects touched during the last physics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// First object.
    pub a: ObjectId,
    /// Second object.
    pub b: ObjectId,
    /// World-space contact point.
    pub position: Vec3,
    /// Contact normal on `b`, pointing from `b` towards `a`.
    pub normal: Vec3,
}

impl CollisionEvent {
    /// Default tolerance of [`CollisionEvent::is_wall`].
    pub const WALL_APPROX: f32 = 0.0125;
    /// Default tolerance of [`CollisionEvent::is_ground`] and [`CollisionEvent::is_ceiling`].
    pub const FLOOR_APPROX: f32 = 0.125;

    /// Whether `object` is one of the two colliding objects.
    #[inline]
    pub fn involves(&self, object: ObjectId) -> bool {
        self.a == object || self.b == object
    }

    /// Whether the contact surface is vertical, within `approx` of a zero dot with +Y.
    pub fn is_wall_with(&self, approx: f32) -> bool {
        self.normal.dot(Vec3::Y).abs() <= approx
    }

    /// Whether `a` rests on top of `b`.
    pub fn is_ground_with(&self, approx: f32) -> bool {
        !self.is_wall_with(approx) && self.normal.y > 0.0
    }

    /// Whether `a` hit the underside of `b`.
    pub fn is_ceiling_with(&self, approx: f32) -> bool {
        !self.is_wall_with(approx) && self.normal.y < 0.0
    }

    /// [`CollisionEvent::is_wall_with`] with the default tolerance.
    pub fn is_wall(&self) -> bool {
        self.is_wall_with(Self::WALL_APPROX)
    }

    /// [`CollisionEvent::is_ground_with`] with the default tolerance.
    pub fn is_ground(&self) -> bool {
        self.is_ground_with(Self::FLOOR_APPROX)
    }

    /// [`CollisionEvent::is_ceiling_with`] with the default tolerance.
    pub fn is_ceiling(&self) -> bool {
        self.is_ceiling_with(Self::FLOOR_APPROX)
    }
}

/// The player capsule touched a game object during the last physics step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerCollisionEvent {
    /// The object.
    pub object: ObjectId,
    /// World-space contact point.
    pub position: Vec3,
    /// Contact normal on the object, pointing towards the player.
    pub normal: Vec3,
}

impl PlayerCollisionEvent {
    /// Whether the player stands on the object.
    pub fn is_ground(&self) -> bool {
        self.normal.dot(Vec3::Y).abs() > CollisionEvent::FLOOR_APPROX && self.normal.y > 0.0
    }
}

/// An application-defined event, raised by a subsystem or a listener.
///
/// The payload is any `'static` value; listeners check its type with
/// [`UserEvent::is`] and read it with [`UserEvent::downcast_ref`]. Clones share
/// the same payload.
#[derive(Clone)]
pub struct UserEvent {
    type_id: TypeId,
    type_name: &'static str,
    origin: Option<String>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl UserEvent {
    /// Wraps `payload`, with no origin.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            origin: None,
            payload: Arc::new(payload),
        }
    }

    /// Names what raised the event, usually a subsystem.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// What raised the event, if it was named.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Type name of the payload, for logs.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type of the payload.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// The payload, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for UserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEvent")
            .field("type_name", &self.type_name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Two user events are equal when they share the same payload.
impl PartialEq for UserEvent {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && self.origin == other.origin
            && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

/// Any event a listener can receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Keyboard transition.
    Key(KeyEvent),
    /// Per-frame mouse state.
    Mouse(MouseEvent),
    /// Per-frame controller state.
    Controller(ControllerEvent),
    /// Timer expiry.
    Time(TimeEvent),
    /// Trigger volume transition.
    Trigger(TriggerEvent),
    /// Tracked hand controller.
    HandController(HandControllerEvent),
    /// Object/object contact.
    Collision(CollisionEvent),
    /// Player/object contact.
    PlayerCollision(PlayerCollisionEvent),
    /// Application-defined event.
    User(UserEvent),
}
