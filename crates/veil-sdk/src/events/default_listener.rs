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

use veil_core::event::{trim, ControllerEvent, HandControllerEvent, KeyEvent, MouseAxisId, MouseEvent};
use veil_core::input::KeyCode;
use veil_core::pose::HandSide;

use super::listener::{EventContext, EventListener};
use crate::player::WalkDirection;

/// Keys used by [`DefaultEventListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    /// Walk forward.
    pub forward: KeyCode,
    /// Walk backward.
    pub backward: KeyCode,
    /// Strafe left.
    pub left: KeyCode,
    /// Strafe right.
    pub right: KeyCode,
    /// Jump.
    pub jump: KeyCode,
    /// Run while held.
    pub run: KeyCode,
    /// Recenter the tracking space.
    pub recenter: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: KeyCode::W,
            backward: KeyCode::S,
            left: KeyCode::A,
            right: KeyCode::D,
            jump: KeyCode::Space,
            run: KeyCode::ShiftLeft,
            recenter: KeyCode::F12,
        }
    }
}

/// Axes and buttons of a gamepad used by [`DefaultEventListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickBindings {
    /// Forward/backward axis, negative is forward.
    pub walk_axis: usize,
    /// Sideways axis.
    pub straff_axis: usize,
    /// Turn axis.
    pub rotate_axis: usize,
    /// Jump button.
    pub jump_button: usize,
    /// Run button, held.
    pub run_button: usize,
}

impl Default for StickBindings {
    fn default() -> Self {
        Self {
            walk_axis: 1,
            straff_axis: 0,
            rotate_axis: 3,
            jump_button: 0,
            run_button: 8,
        }
    }
}

/// Walk with WASD or the left stick, turn with the mouse or the right stick.
///
/// Shift runs, space jumps, F12 recenters. On tracked hand controllers the
/// left thumbstick walks and the right one turns. Analog values are dead-zone
/// trimmed here, not at capture.
#[derive(Debug, Clone, Default)]
pub struct DefaultEventListener {
    /// Keyboard mapping.
    pub keys: KeyBindings,
    /// Gamepad mapping.
    pub stick: StickBindings,
}

impl DefaultEventListener {
    /// Creates a listener with the default bindings.
    pub fn new() -> Self {
        Self::default()
    }

    fn walk_direction(&self, key: KeyCode) -> Option<WalkDirection> {
        match key {
            k if k == self.keys.forward => Some(WalkDirection::Forward),
            k if k == self.keys.backward => Some(WalkDirection::Backward),
            k if k == self.keys.left => Some(WalkDirection::Left),
            k if k == self.keys.right => Some(WalkDirection::Right),
            _ => None,
        }
    }

    fn jump(ctx: &mut EventContext<'_>) {
        if let Err(e) = ctx.player.jump(&mut *ctx.physics) {
            log::debug!("Jump ignored: {e}");
        }
    }
}

impl EventListener for DefaultEventListener {
    fn key_event(&mut self, event: &KeyEvent, ctx: &mut EventContext<'_>) {
        if event.should_ignore() {
            return;
        }
        if let Some(direction) = self.walk_direction(event.key) {
            ctx.player.set_walking(direction, event.pressed);
        } else if event.key == self.keys.run {
            ctx.player.set_run(event.pressed);
        } else if event.key == self.keys.jump && event.pressed {
            Self::jump(ctx);
        } else if event.key == self.keys.recenter && event.pressed {
            ctx.request_recenter();
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent, ctx: &mut EventContext<'_>) {
        let relative = event.axis(MouseAxisId::X).rel;
        ctx.player.apply_mouse_relative_rotation(relative);
    }

    fn controller_event(&mut self, event: &ControllerEvent, ctx: &mut EventContext<'_>) {
        let deadzone = ctx.deadzone();
        ctx.player
            .set_analog_walk(trim(event.axis(self.stick.walk_axis), deadzone));
        ctx.player
            .set_analog_straff(trim(event.axis(self.stick.straff_axis), deadzone));
        ctx.player
            .set_analog_rotate(trim(event.axis(self.stick.rotate_axis), deadzone));

        if event.was_pressed(self.stick.run_button) {
            ctx.player.set_run(true);
        } else if event.was_released(self.stick.run_button) {
            ctx.player.set_run(false);
        }
        if event.was_pressed(self.stick.jump_button) {
            Self::jump(ctx);
        }
    }

    fn hand_controller_event(&mut self, event: &HandControllerEvent, ctx: &mut EventContext<'_>) {
        let deadzone = ctx.deadzone();
        let axis = |i: usize| trim(event.state.axes.get(i).copied().unwrap_or(0.0), deadzone);
        match event.side() {
            // Thumbstick up is positive, walking forward is negative.
            HandSide::Left => {
                ctx.player.set_analog_straff(axis(0));
                ctx.player.set_analog_walk(-axis(1));
            }
            HandSide::Right => ctx.player.set_analog_rotate(axis(0)),
        }
    }
}
