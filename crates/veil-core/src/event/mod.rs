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

//! Provides the event vocabulary and the buffered channel events travel through.
//!
//! The [`EventBus`] is a generic MPSC buffer: the physics world pushes its
//! notifications into it during a step and the event manager drains it once per
//! frame. The value types in [`types`] are what listeners finally receive.

mod bus;
pub mod types;

pub use self::bus::EventBus;
pub use self::types::{
    CollisionEvent, ControllerEvent, ControllerId, Event, HandControllerEvent, KeyEvent,
    MouseAxisId, MouseEvent, PlayerCollisionEvent, TimeEvent, TimerId, TriggerEvent, UserEvent,
};

/// Zeroes analog values inside the dead-zone.
///
/// Returns `0.0` when `|value| < deadzone` and `value` unchanged otherwise;
/// a value exactly on the boundary is kept.
///
/// ```
/// use veil_core::event::trim;
/// assert_eq!(trim(0.1, 0.15), 0.0);
/// assert_eq!(trim(-0.15, 0.15), -0.15);
/// assert_eq!(trim(0.9, 0.15), 0.9);
/// ```
#[inline]
pub fn trim(value: f32, deadzone: f32) -> f32 {
    if value.abs() >= deadzone {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::trim;

    #[test]
    fn trim_zeroes_inside_deadzone() {
        for v in [0.0, 0.05, -0.05, 0.1499, -0.1499] {
            assert_eq!(trim(v, 0.15), 0.0, "{v} is inside the dead-zone");
        }
    }

    #[test]
    fn trim_keeps_values_on_and_beyond_boundary() {
        for v in [0.15, -0.15, 0.5, -1.0] {
            assert_eq!(trim(v, 0.15), v, "{v} is outside or on the dead-zone");
        }
    }

    #[test]
    fn trim_with_zero_deadzone_is_identity() {
        assert_eq!(trim(0.0, 0.0), 0.0);
        assert_eq!(trim(1e-9, 0.0), 1e-9);
    }
}
