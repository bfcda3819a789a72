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

//! Provides translation from a concrete windowing backend (`winit`) to the engine's raw input devices.
//!
//! `winit` pushes events; the engine polls devices once per frame. [`WinitInput`]
//! sits in between: the window loop feeds it every event, and the keyboard and
//! mouse devices it hands out report the accumulated state when polled.

use std::cell::RefCell;
use std::rc::Rc;

use veil_core::input::{
    DeviceState, InputDevice, KeyCode, KeyboardState, MouseAxis, MouseButton, MouseState,
};
use winit::event::{
    DeviceEvent, ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

#[derive(Debug, Default)]
struct SharedInput {
    keyboard: KeyboardState,
    buttons: [bool; MouseButton::COUNT],
    axes: [MouseAxis; 3],
    pending_rel: [i32; 3],
    last_cursor: Option<(f64, f64)>,
    cursor_grabbed: bool,
}

/// Collects winit events into pollable keyboard and mouse state.
#[derive(Debug, Clone, Default)]
pub struct WinitInput {
    shared: Rc<RefCell<SharedInput>>,
}

impl WinitInput {
    /// Creates an adapter with every key and button released.
    pub fn new() -> Self {
        Self::default()
    }

    /// A keyboard device reading from this adapter.
    pub fn keyboard(&self) -> WinitKeyboard {
        WinitKeyboard {
            shared: Rc::clone(&self.shared),
        }
    }

    /// A mouse device reading from this adapter.
    pub fn mouse(&self) -> WinitMouse {
        WinitMouse {
            shared: Rc::clone(&self.shared),
        }
    }

    /// While grabbed, relative motion comes from raw device events instead of the cursor.
    pub fn set_cursor_grabbed(&self, grabbed: bool) {
        self.shared.borrow_mut().cursor_grabbed = grabbed;
    }

    /// Feeds a window event. Returns `true` if it was an input event.
    pub fn handle_window_event(&self, event: &WindowEvent) -> bool {
        let mut input = self.shared.borrow_mut();
        match event {
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                let PhysicalKey::Code(code) = key_event.physical_key else {
                    return false;
                };
                let Some(key) = translate_keycode(code) else {
                    log::trace!("Unmapped key {code:?} ignored.");
                    return false;
                };
                input
                    .keyboard
                    .set(key, key_event.state == ElementState::Pressed);
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = translate_mouse_button(*button) else {
                    return false;
                };
                input.buttons[button.index()] = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((last_x, last_y)) = input.last_cursor {
                    if !input.cursor_grabbed {
                        input.pending_rel[0] += (position.x - last_x).round() as i32;
                        input.pending_rel[1] += (position.y - last_y).round() as i32;
                    }
                }
                input.last_cursor = Some((position.x, position.y));
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                input.pending_rel[2] += match delta {
                    MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
                    MouseScrollDelta::PixelDelta(pos) => pos.y.round() as i32,
                };
                true
            }
            WindowEvent::Focused(false) => {
                // Releases are never delivered to an unfocused window.
                input.keyboard.clear();
                input.buttons = [false; MouseButton::COUNT];
                false
            }
            _ => false,
        }
    }

    /// Feeds a raw device event.
    pub fn handle_device_event(&self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let mut input = self.shared.borrow_mut();
            if input.cursor_grabbed {
                input.pending_rel[0] += dx.round() as i32;
                input.pending_rel[1] += dy.round() as i32;
            }
        }
    }
}

/// Keyboard device backed by a [`WinitInput`].
#[derive(Debug)]
pub struct WinitKeyboard {
    shared: Rc<RefCell<SharedInput>>,
}

impl InputDevice for WinitKeyboard {
    fn name(&self) -> &str {
        "winit keyboard"
    }

    fn poll(&mut self) -> DeviceState {
        DeviceState::Keyboard(self.shared.borrow().keyboard.clone())
    }
}

/// Mouse device backed by a [`WinitInput`].
#[derive(Debug)]
pub struct WinitMouse {
    shared: Rc<RefCell<SharedInput>>,
}

impl InputDevice for WinitMouse {
    fn name(&self) -> &str {
        "winit mouse"
    }

    fn poll(&mut self) -> DeviceState {
        let mut input = self.shared.borrow_mut();
        let pending = std::mem::take(&mut input.pending_rel);
        for (axis, rel) in input.axes.iter_mut().zip(pending) {
            axis.rel = rel;
            axis.abs += rel;
        }
        DeviceState::Mouse(MouseState {
            axes: input.axes,
            buttons: input.buttons,
        })
    }
}

/// Maps a winit physical key to the engine's key code.
pub fn translate_keycode(code: WinitKeyCode) -> Option<KeyCode> {
    use WinitKeyCode as W;
    let key = match code {
        W::KeyA => KeyCode::A,
        W::KeyB => KeyCode::B,
        W::KeyC => KeyCode::C,
        W::KeyD => KeyCode::D,
        W::KeyE => KeyCode::E,
        W::KeyF => KeyCode::F,
        W::KeyG => KeyCode::G,
        W::KeyH => KeyCode::H,
        W::KeyI => KeyCode::I,
        W::KeyJ => KeyCode::J,
        W::KeyK => KeyCode::K,
        W::KeyL => KeyCode::L,
        W::KeyM => KeyCode::M,
        W::KeyN => KeyCode::N,
        W::KeyO => KeyCode::O,
        W::KeyP => KeyCode::P,
        W::KeyQ => KeyCode::Q,
        W::KeyR => KeyCode::R,
        W::KeyS => KeyCode::S,
        W::KeyT => KeyCode::T,
        W::KeyU => KeyCode::U,
        W::KeyV => KeyCode::V,
        W::KeyW => KeyCode::W,
        W::KeyX => KeyCode::X,
        W::KeyY => KeyCode::Y,
        W::KeyZ => KeyCode::Z,
        W::Digit0 => KeyCode::Digit0,
        W::Digit1 => KeyCode::Digit1,
        W::Digit2 => KeyCode::Digit2,
        W::Digit3 => KeyCode::Digit3,
        W::Digit4 => KeyCode::Digit4,
        W::Digit5 => KeyCode::Digit5,
        W::Digit6 => KeyCode::Digit6,
        W::Digit7 => KeyCode::Digit7,
        W::Digit8 => KeyCode::Digit8,
        W::Digit9 => KeyCode::Digit9,
        W::F1 => KeyCode::F1,
        W::F2 => KeyCode::F2,
        W::F3 => KeyCode::F3,
        W::F4 => KeyCode::F4,
        W::F5 => KeyCode::F5,
        W::F6 => KeyCode::F6,
        W::F7 => KeyCode::F7,
        W::F8 => KeyCode::F8,
        W::F9 => KeyCode::F9,
        W::F10 => KeyCode::F10,
        W::F11 => KeyCode::F11,
        W::F12 => KeyCode::F12,
        W::Escape => KeyCode::Escape,
        W::Tab => KeyCode::Tab,
        W::CapsLock => KeyCode::CapsLock,
        W::Space => KeyCode::Space,
        W::Enter => KeyCode::Enter,
        W::Backspace => KeyCode::Backspace,
        W::Delete => KeyCode::Delete,
        W::Insert => KeyCode::Insert,
        W::Home => KeyCode::Home,
        W::End => KeyCode::End,
        W::PageUp => KeyCode::PageUp,
        W::PageDown => KeyCode::PageDown,
        W::ArrowUp => KeyCode::ArrowUp,
        W::ArrowDown => KeyCode::ArrowDown,
        W::ArrowLeft => KeyCode::ArrowLeft,
        W::ArrowRight => KeyCode::ArrowRight,
        W::ShiftLeft => KeyCode::ShiftLeft,
        W::ShiftRight => KeyCode::ShiftRight,
        W::ControlLeft => KeyCode::ControlLeft,
        W::ControlRight => KeyCode::ControlRight,
        W::AltLeft => KeyCode::AltLeft,
        W::AltRight => KeyCode::AltRight,
        W::Backquote => KeyCode::Backquote,
        W::Minus => KeyCode::Minus,
        W::Equal => KeyCode::Equal,
        W::BracketLeft => KeyCode::BracketLeft,
        W::BracketRight => KeyCode::BracketRight,
        W::Backslash => KeyCode::Backslash,
        W::Semicolon => KeyCode::Semicolon,
        W::Quote => KeyCode::Quote,
        W::Comma => KeyCode::Comma,
        W::Period => KeyCode::Period,
        W::Slash => KeyCode::Slash,
        _ => return None,
    };
    Some(key)
}

/// Maps a winit mouse button to the engine's button, `None` for extra buttons.
pub fn translate_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Right => Some(MouseButton::Right),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        WinitMouseButton::Back => Some(MouseButton::Back),
        WinitMouseButton::Forward => Some(MouseButton::Forward),
        WinitMouseButton::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::{DeviceId, TouchPhase};

    fn poll_mouse(mouse: &mut WinitMouse) -> MouseState {
        match mouse.poll() {
            DeviceState::Mouse(state) => state,
            other => panic!("mouse reported {other:?}"),
        }
    }

    fn cursor_to(x: f64, y: f64) -> WindowEvent {
        WindowEvent::CursorMoved {
            device_id: DeviceId::dummy(),
            position: PhysicalPosition::new(x, y),
        }
    }

    #[test]
    fn test_translate_keycode() {
        assert_eq!(translate_keycode(WinitKeyCode::KeyW), Some(KeyCode::W));
        assert_eq!(translate_keycode(WinitKeyCode::Digit1), Some(KeyCode::Digit1));
        assert_eq!(translate_keycode(WinitKeyCode::F12), Some(KeyCode::F12));
        assert_eq!(translate_keycode(WinitKeyCode::ShiftLeft), Some(KeyCode::ShiftLeft));
        assert_eq!(translate_keycode(WinitKeyCode::NumpadAdd), None);
    }

    #[test]
    fn test_translate_mouse_button() {
        assert_eq!(
            translate_mouse_button(WinitMouseButton::Left),
            Some(MouseButton::Left)
        );
        assert_eq!(
            translate_mouse_button(WinitMouseButton::Forward),
            Some(MouseButton::Forward)
        );
        assert_eq!(translate_mouse_button(WinitMouseButton::Other(8)), None);
    }

    #[test]
    fn test_mouse_button_state_is_polled() {
        let input = WinitInput::new();
        let mut mouse = input.mouse();
        let pressed = WindowEvent::MouseInput {
            device_id: DeviceId::dummy(),
            state: ElementState::Pressed,
            button: WinitMouseButton::Right,
        };
        assert!(input.handle_window_event(&pressed));
        assert!(poll_mouse(&mut mouse).buttons[MouseButton::Right.index()]);

        input.handle_window_event(&WindowEvent::Focused(false));
        assert!(!poll_mouse(&mut mouse).buttons[MouseButton::Right.index()]);
    }

    #[test]
    fn test_relative_motion_is_consumed_by_poll() {
        let input = WinitInput::new();
        let mut mouse = input.mouse();
        input.handle_window_event(&cursor_to(100.0, 100.0));
        input.handle_window_event(&cursor_to(110.0, 95.0));
        input.handle_window_event(&cursor_to(115.0, 95.0));

        let state = poll_mouse(&mut mouse);
        assert_eq!(state.axes[0].rel, 15);
        assert_eq!(state.axes[1].rel, -5);
        assert_eq!(state.axes[0].abs, 15);

        let state = poll_mouse(&mut mouse);
        assert_eq!(state.axes[0].rel, 0, "motion is reported once");
        assert_eq!(state.axes[0].abs, 15);
    }

    #[test]
    fn test_wheel_accumulates_on_z() {
        let input = WinitInput::new();
        let mut mouse = input.mouse();
        input.handle_window_event(&WindowEvent::MouseWheel {
            device_id: DeviceId::dummy(),
            delta: MouseScrollDelta::LineDelta(0.0, 2.0),
            phase: TouchPhase::Moved,
        });
        assert_eq!(poll_mouse(&mut mouse).axes[2].rel, 2);
    }

    #[test]
    fn test_grabbed_cursor_uses_raw_motion() {
        let input = WinitInput::new();
        let mut mouse = input.mouse();
        input.set_cursor_grabbed(true);
        input.handle_window_event(&cursor_to(0.0, 0.0));
        input.handle_window_event(&cursor_to(50.0, 0.0));
        input.handle_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -2.0) });

        let state = poll_mouse(&mut mouse);
        assert_eq!(state.axes[0].rel, 3);
        assert_eq!(state.axes[1].rel, -2);
    }

    #[test]
    fn test_non_input_events_are_ignored() {
        let input = WinitInput::new();
        assert!(!input.handle_window_event(&WindowEvent::CloseRequested));
        assert!(!input.handle_window_event(&WindowEvent::Resized(
            winit::dpi::PhysicalSize::new(100, 100)
        )));
    }
}
