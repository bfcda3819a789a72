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

//! # Engine Loop
//!
//! [`Engine::frame`] runs one frame in a fixed order:
//!
//! 1. acquire the head pose and frame time from the [`PoseSource`],
//! 2. reconcile the [`PlayerBody`] with its authority,
//! 3. update the level manager, the game objects, the physics world and the
//!    event manager, in that order,
//! 4. update user subsystems in registration order,
//! 5. hand the reconciled camera pose to the [`FrameSink`].
//!
//! Running physics before the player update, or event dispatch before
//! physics, would let gameplay observe a position that is not the one the
//! frame is rendered with.

mod windowed;

pub use self::windowed::run_windowed;

use veil_core::input::InputDevice;
use veil_core::physics::{DebugLine, PhysicsProvider};
use veil_core::pose::{CameraRig, Pose, PoseSource, VrBackend};
use veil_infra::{open_pose_source, RapierPhysicsWorld};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EventManager, FrameEvents};
use crate::levels::LevelManager;
use crate::objects::GameObjectManager;
use crate::player::PlayerBody;

/// Mutable access to the engine state handed to levels and subsystems.
pub struct FrameContext<'a> {
    /// Frame number, starting at 1 for the first frame.
    pub frame: u64,
    /// Duration of this frame in seconds.
    pub delta_time: f32,
    /// The player.
    pub player: &'a mut PlayerBody,
    /// The physics world.
    pub physics: &'a mut dyn PhysicsProvider,
    /// Game objects and triggers.
    pub objects: &'a mut GameObjectManager,
    /// Listeners, timers and input devices.
    pub events: &'a mut EventManager,
}

/// A per-frame update hook registered on the engine.
///
/// A subsystem talks to listeners by queuing a
/// [`UserEvent`](veil_core::event::UserEvent) on `ctx.events`; it is delivered
/// during the next frame's event update.
pub trait Subsystem {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs after the event manager, once per frame. Errors are logged.
    fn update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()>;
}

/// What the renderer needs to draw a frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Frame number.
    pub frame: u64,
    /// Camera rig in gameplay space.
    pub rig: CameraRig,
    /// Head pose in gameplay space.
    pub head: Pose,
    /// Physics debug lines, empty unless debug drawing is on.
    pub debug_lines: &'a [DebugLine],
}

impl FrameView<'_> {
    /// Debug lines as raw line-list vertex data.
    pub fn debug_line_bytes(&self) -> &[u8] {
        DebugLine::as_bytes(self.debug_lines)
    }
}

/// Consumer of the reconciled camera pose, typically a renderer.
pub trait FrameSink {
    /// Receives the frame once all updates are done.
    fn submit(&mut self, view: &FrameView<'_>);
}

/// Summary of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Frame number.
    pub frame: u64,
    /// Frame time used by every subsystem.
    pub delta_time: f32,
    /// Sum of the frame times so far.
    pub elapsed: f64,
    /// Physics substeps simulated.
    pub substeps: u32,
    /// What the event manager delivered.
    pub events: FrameEvents,
    /// Head pose the frame was built for.
    pub head: Pose,
}

/// The engine: owns every subsystem and runs the frame loop.
pub struct Engine {
    config: EngineConfig,
    pose_source: Box<dyn PoseSource>,
    physics: Box<dyn PhysicsProvider>,
    player: PlayerBody,
    events: EventManager,
    objects: GameObjectManager,
    levels: LevelManager,
    subsystems: Vec<Box<dyn Subsystem>>,
    frame_sink: Option<Box<dyn FrameSink>>,
    frame: u64,
    elapsed: f64,
    quit: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.pose_source.backend())
            .field("player", &self.player)
            .field("events", &self.events)
            .field("levels", &self.levels)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Builds the engine from its configuration.
    ///
    /// Opens the configured VR backend, falling back to the windowed NoVR
    /// source when allowed, and creates the Rapier physics world.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let physics = RapierPhysicsWorld::new(config.physics)?;
        let pose_source = match open_pose_source(config.backend, config.simulated_frame_time) {
            Ok(source) => source,
            Err(e) if config.fallback_to_novr && config.backend != VrBackend::NoVr => {
                log::warn!("{e}. Falling back to {:?}.", VrBackend::NoVr);
                open_pose_source(VrBackend::NoVr, config.simulated_frame_time)?
            }
            Err(e) => return Err(e.into()),
        };
        Self::with_parts(config, pose_source, Box::new(physics))
    }

    /// Builds the engine around an existing pose source and physics world.
    pub fn with_parts(
        config: EngineConfig,
        pose_source: Box<dyn PoseSource>,
        mut physics: Box<dyn PhysicsProvider>,
    ) -> Result<Self, EngineError> {
        let events = EventManager::new(config.input);
        physics.set_notification_sink(events.physics_sender());
        physics.set_debug_drawing(config.debug_physics);

        let mut player = PlayerBody::from_config(&config.player);
        player.set_tuning(config.effective_tuning());
        player.init_physics(physics.as_mut())?;
        if config.lock_player_parameters {
            player.lock_parameters();
        }

        log::info!(
            "Engine ready: backend {:?}, player {:?} at {:?}.",
            pose_source.backend(),
            player.mode(),
            player.position()
        );
        Ok(Self {
            config,
            pose_source,
            physics,
            player,
            events,
            objects: GameObjectManager::new(),
            levels: LevelManager::new(),
            subsystems: Vec::new(),
            frame_sink: None,
            frame: 0,
            elapsed: 0.0,
            quit: false,
        })
    }

    /// Runs one frame.
    ///
    /// A pose source failure aborts the frame before anything moves. A level
    /// that fails to load does not: the rest of the frame still runs and the
    /// load error is returned at the end.
    pub fn frame(&mut self) -> Result<FrameInfo, EngineError> {
        let sample = self.pose_source.acquire(&self.player.camera_rig())?;
        let dt = sample.delta_time as f32;
        self.frame += 1;
        self.elapsed += sample.delta_time;
        self.player.set_tracked_head_pose(sample.head);
        self.events.set_hand_controllers(sample.hands);

        self.player.engine_update(dt, self.physics.as_mut())?;

        let level_result = self.levels.update(&mut FrameContext {
            frame: self.frame,
            delta_time: dt,
            player: &mut self.player,
            physics: self.physics.as_mut(),
            objects: &mut self.objects,
            events: &mut self.events,
        });
        if let Err(e) = &level_result {
            log::error!("Level update failed: {e}");
        }
        self.objects.update(self.physics.as_ref());
        let substeps = self.physics.step(dt);
        let events = self
            .events
            .update(dt, &mut self.player, self.physics.as_mut());
        if self.events.take_recenter_request() {
            log::info!("Recentering tracking space.");
            self.pose_source.recenter();
        }

        let mut ctx = FrameContext {
            frame: self.frame,
            delta_time: dt,
            player: &mut self.player,
            physics: self.physics.as_mut(),
            objects: &mut self.objects,
            events: &mut self.events,
        };
        for subsystem in &mut self.subsystems {
            if let Err(e) = subsystem.update(&mut ctx) {
                log::error!("Subsystem '{}' failed: {e:#}", subsystem.name());
            }
        }

        let head = self.player.tracked_head_pose();
        if let Some(sink) = self.frame_sink.as_mut() {
            sink.submit(&FrameView {
                frame: self.frame,
                rig: self.player.camera_rig(),
                head,
                debug_lines: self.physics.debug_lines(),
            });
        }

        log::trace!(
            "Frame {} done: dt {dt:.4}, {substeps} substeps, {} events.",
            self.frame,
            events.delivered
        );
        level_result?;
        Ok(FrameInfo {
            frame: self.frame,
            delta_time: dt,
            elapsed: self.elapsed,
            substeps,
            events,
            head,
        })
    }

    /// Runs up to `count` frames, stopping early once a quit was requested.
    ///
    /// Returns the number of frames run.
    pub fn run_frames(&mut self, count: u64) -> Result<u64, EngineError> {
        let mut ran = 0;
        while ran < count && !self.quit {
            self.frame()?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Mutable access to the engine state outside of a frame, for setup code.
    pub fn context(&mut self) -> FrameContext<'_> {
        FrameContext {
            frame: self.frame,
            delta_time: 0.0,
            player: &mut self.player,
            physics: self.physics.as_mut(),
            objects: &mut self.objects,
            events: &mut self.events,
        }
    }

    /// Adds a subsystem updated after the event manager.
    pub fn register_subsystem(&mut self, subsystem: Box<dyn Subsystem>) {
        log::debug!("Subsystem '{}' registered.", subsystem.name());
        self.subsystems.push(subsystem);
    }

    /// Sets the consumer of the reconciled camera pose.
    pub fn set_frame_sink(&mut self, sink: Box<dyn FrameSink>) {
        self.frame_sink = Some(sink);
    }

    /// Adds an input device polled by the event manager.
    pub fn add_input_device(&mut self, device: Box<dyn InputDevice>) {
        self.events.add_input_device(device);
    }

    /// Asks the loop to stop after the current frame.
    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Whether a quit was requested.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Backend of the pose source in use.
    pub fn backend(&self) -> VrBackend {
        self.pose_source.backend()
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Sum of the frame times so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// The player.
    pub fn player(&self) -> &PlayerBody {
        &self.player
    }

    /// The player, mutably.
    pub fn player_mut(&mut self) -> &mut PlayerBody {
        &mut self.player
    }

    /// The physics world.
    pub fn physics(&self) -> &dyn PhysicsProvider {
        self.physics.as_ref()
    }

    /// The physics world, mutably.
    pub fn physics_mut(&mut self) -> &mut dyn PhysicsProvider {
        self.physics.as_mut()
    }

    /// The event manager.
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// The event manager, mutably.
    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    /// Game objects and triggers.
    pub fn objects(&self) -> &GameObjectManager {
        &self.objects
    }

    /// The level manager.
    pub fn levels(&self) -> &LevelManager {
        &self.levels
    }

    /// The level manager, mutably.
    pub fn levels_mut(&mut self) -> &mut LevelManager {
        &mut self.levels
    }
}
