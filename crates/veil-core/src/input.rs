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

//! Raw input device contract.
//!
//! Devices expose their *current* state only; turning state into edge events is
//! the event manager's job.

use serde::{Deserialize, Serialize};

macro_rules! key_codes {
    ($($key:ident),+ $(,)?) => {
        /// A physical keyboard key, layout independent.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum KeyCode {
            $($key),+
        }

        impl KeyCode {
            /// Every key, in declaration order.
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$key),+];
            /// Number of keys.
            pub const COUNT: usize = Self::ALL.len();

            /// Dense index of the key, usable into `[_; KeyCode::COUNT]` arrays.
            #[inline]
            pub const fn index(self) -> usize {
                self as usize
            }
        }
    };
}

key_codes!(
    A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Escape, Tab, CapsLock, Space, Enter, Backspace, Delete, Insert, Home, End, PageUp, PageDown,
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    ShiftLeft, ShiftRight, ControlLeft, ControlRight, AltLeft, AltRight,
    Backquote, Minus, Equal, BracketLeft, BracketRight, Backslash, Semicolon, Quote, Comma,
    Period, Slash,
);

/// A mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Wheel button.
    Middle,
    /// Side "back" button.
    Back,
    /// Side "forward" button.
    Forward,
}

impl MouseButton {
    /// Every button, in index order.
    pub const ALL: [MouseButton; 5] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Back,
        MouseButton::Forward,
    ];
    /// Number of buttons.
    pub const COUNT: usize = Self::ALL.len();

    /// Dense index of the button.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Pressed state of every key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardState {
    down: [bool; KeyCode::COUNT],
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self {
            down: [false; KeyCode::COUNT],
        }
    }
}

impl KeyboardState {
    /// Whether `key` is held.
    #[inline]
    pub fn is_down(&self, key: KeyCode) -> bool {
        self.down[key.index()]
    }

    /// Records `key` as held or released.
    #[inline]
    pub fn set(&mut self, key: KeyCode, down: bool) {
        self.down[key.index()] = down;
    }

    /// Releases every key.
    pub fn clear(&mut self) {
        self.down = [false; KeyCode::COUNT];
    }
}

/// One mouse axis: movement since the previous poll and accumulated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseAxis {
    /// Movement since the previous poll.
    pub rel: i32,
    /// Absolute position.
    pub abs: i32,
}

/// Mouse axes (X, Y and wheel as Z) and buttons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseState {
    /// X, Y and wheel axes.
    pub axes: [MouseAxis; 3],
    /// Held buttons, indexed by [`MouseButton::index`].
    pub buttons: [bool; MouseButton::COUNT],
}

/// Direction of a point-of-view hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum PovDirection {
    #[default]
    Centered,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// State of a joystick or gamepad.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerState {
    /// Vendor string reported by the driver.
    pub vendor: String,
    /// Raw axis values in `[-1, 1]`, not dead-zone filtered.
    pub axes: Vec<f32>,
    /// Held buttons.
    pub buttons: Vec<bool>,
    /// Point-of-view hats.
    pub povs: Vec<PovDirection>,
    /// Whether the buttons follow the Xbox layout.
    pub xbox_layout: bool,
}

/// What a device reports when polled.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceState {
    /// A keyboard.
    Keyboard(KeyboardState),
    /// A mouse.
    Mouse(MouseState),
    /// A joystick or gamepad.
    Controller(ControllerState),
}

/// A raw input device, polled once per frame.
pub trait InputDevice {
    /// Human readable device name.
    fn name(&self) -> &str;

    /// Returns the device's current state.
    ///
    /// Relative mouse motion accumulated since the previous poll is consumed.
    fn poll(&mut self) -> DeviceState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_indices_are_dense() {
        for (i, key) in KeyCode::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
        assert_eq!(KeyCode::COUNT, KeyCode::ALL.len());
    }

    #[test]
    fn test_keyboard_state_set_and_clear() {
        let mut state = KeyboardState::default();
        state.set(KeyCode::W, true);
        assert!(state.is_down(KeyCode::W));
        assert!(!state.is_down(KeyCode::S));
        state.clear();
        assert!(!state.is_down(KeyCode::W));
    }
}
