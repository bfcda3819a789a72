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

//! The demo level: a floor, a stack of crates and a trigger pad.

use std::cell::RefCell;
use std::rc::Rc;

use veil_sdk::events::ListenerHandle;
use veil_sdk::prelude::*;

/// Seconds between two "still alive" log lines.
const HEARTBEAT: f64 = 5.0;

/// Logs what happens in the level and re-arms a heartbeat timer.
#[derive(Debug, Default)]
struct Narrator {
    heartbeats: u64,
}

impl EventListener for Narrator {
    fn time_event(&mut self, _event: &TimeEvent, ctx: &mut EventContext<'_>) {
        self.heartbeats += 1;
        log::info!(
            "Heartbeat {} at t = {:.1}s, player at {:?}.",
            self.heartbeats,
            ctx.now(),
            ctx.player.position()
        );
        ctx.fire_timer(HEARTBEAT);
    }

    fn trigger_event(&mut self, event: &TriggerEvent, _ctx: &mut EventContext<'_>) {
        let verb = if event.contact { "entered" } else { "left" };
        log::info!("{:?} {verb} trigger {}.", event.other, event.trigger);
    }

    fn collision_event(&mut self, event: &CollisionEvent, _ctx: &mut EventContext<'_>) {
        if !event.is_ground() {
            log::debug!("{} hit {} at {:?}.", event.a, event.b, event.position);
        }
    }
}

/// The only level of the demo.
#[derive(Default)]
pub struct DemoLevel {
    controls: Option<Rc<RefCell<DefaultEventListener>>>,
    narrator: Option<Rc<RefCell<Narrator>>>,
    handles: Vec<ListenerHandle>,
}

impl Level for DemoLevel {
    fn name(&self) -> &str {
        "demo"
    }

    fn load(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let objects = &mut *ctx.objects;
        let physics = &mut *ctx.physics;

        let floor = objects.create_object("floor", Vec3::new(0.0, -0.5, 0.0), Quat::IDENTITY);
        objects.setup_physics(
            floor,
            0.0,
            ColliderShape::Box(Vec3::new(20.0, 0.5, 20.0)),
            physics,
        )?;

        for i in 0..3u8 {
            let y = 0.5 + f32::from(i) * 1.05;
            let id = objects.create_object(
                format!("crate-{i}"),
                Vec3::new(2.0, y, 6.0),
                Quat::from_yaw(0.2 * f32::from(i)),
            );
            objects.setup_physics(
                id,
                10.0,
                ColliderShape::Box(Vec3::new(0.5, 0.5, 0.5)),
                physics,
            )?;
        }

        objects.create_trigger(
            ColliderShape::Box(Vec3::new(1.0, 1.0, 1.0)),
            Vec3::new(-2.0, 1.0, 6.0),
            physics,
        )?;

        let controls = Rc::new(RefCell::new(DefaultEventListener::new()));
        let narrator = Rc::new(RefCell::new(Narrator::default()));
        self.handles.push(ctx.events.add_listener(&controls)?);
        self.handles.push(ctx.events.add_listener(&narrator)?);
        ctx.events.fire_timer(HEARTBEAT);
        self.controls = Some(controls);
        self.narrator = Some(narrator);

        ctx.player
            .teleport(Vec3::new(0.0, 0.0, 10.0), Some(0.0), &mut *ctx.physics)?;
        log::info!("Demo level loaded: {} objects.", ctx.objects.len());
        Ok(())
    }

    fn unload(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        for handle in self.handles.drain(..) {
            if let Err(e) = ctx.events.remove_listener(handle) {
                log::warn!("{e}");
            }
        }
        self.controls = None;
        self.narrator = None;
        ctx.objects.clear(&mut *ctx.physics);
        Ok(())
    }

    fn run_logic(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        // Falling off the floor puts the player back at the start.
        if ctx.player.position().y < -20.0 {
            log::info!("Player fell off the world, respawning.");
            ctx.player
                .teleport(Vec3::new(0.0, 0.0, 10.0), Some(0.0), &mut *ctx.physics)?;
        }
        Ok(())
    }
}

/// Logs the camera once per second of frames.
#[derive(Debug, Default)]
pub struct CameraLog;

impl FrameSink for CameraLog {
    fn submit(&mut self, view: &FrameView<'_>) {
        if view.frame % 90 == 0 {
            log::debug!(
                "Frame {}: head at {:?}, {} debug lines ({} bytes).",
                view.frame,
                view.head.position,
                view.debug_lines.len(),
                view.debug_line_bytes().len()
            );
        }
    }
}
