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

//! Drives an [`Engine`] from a winit window.

use anyhow::Result;
use veil_infra::WinitInput;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use super::Engine;

struct WindowedApp {
    engine: Engine,
    input: WinitInput,
    window: Option<Window>,
    failure: Option<anyhow::Error>,
}

impl WindowedApp {
    fn set_grab(&mut self, grabbed: bool) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let mode = if grabbed {
            CursorGrabMode::Locked
        } else {
            CursorGrabMode::None
        };
        let mut result = window.set_cursor_grab(mode);
        if grabbed && result.is_err() {
            result = window.set_cursor_grab(CursorGrabMode::Confined);
        }
        match result {
            Ok(()) => {
                window.set_cursor_visible(!grabbed);
                self.input.set_cursor_grabbed(grabbed);
            }
            Err(e) => log::warn!("Cursor grab change refused: {e}"),
        }
    }
}

impl Drop for WindowedApp {
    fn drop(&mut self) {
        log::info!(
            "Shutting down after {} frames ({:.1}s).",
            self.engine.frame_count(),
            self.engine.elapsed()
        );
    }
}

impl ApplicationHandler for WindowedApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title(&self.engine.config().window_title);
        match event_loop.create_window(attributes) {
            Ok(window) => {
                log::info!("Window '{}' created.", self.engine.config().window_title);
                self.window = Some(window);
            }
            Err(e) => {
                self.failure = Some(e.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(Window::id) != Some(id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutdown requested, exiting event loop...");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.engine.frame() {
                    log::error!("Frame failed: {e}");
                    self.failure = Some(e.into());
                    event_loop.exit();
                    return;
                }
                if self.engine.should_quit() {
                    event_loop.exit();
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.set_grab(true);
                self.input.handle_window_event(&event);
            }
            WindowEvent::KeyboardInput {
                event: ref key_event,
                ..
            } if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape) => {
                self.set_grab(false);
                self.input.handle_window_event(&event);
            }
            _ => {
                self.input.handle_window_event(&event);
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        self.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Opens a window, plugs the keyboard and mouse into `engine` and runs frames
/// until the window closes, a quit is requested or a frame fails.
///
/// Left click grabs the cursor for mouse look; Escape releases it.
pub fn run_windowed(mut engine: Engine) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let input = WinitInput::new();
    engine.add_input_device(Box::new(input.keyboard()));
    engine.add_input_device(Box::new(input.mouse()));

    let mut app = WindowedApp {
        engine,
        input,
        window: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
