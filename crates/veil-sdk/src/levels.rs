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

//! Levels and the manager switching between them.

use crate::engine::FrameContext;
use crate::error::EngineError;

/// A piece of content: sets up objects and listeners, runs per-frame logic.
pub trait Level {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Creates the level's content.
    fn load(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()>;

    /// Removes the level's content. Clears every object and trigger by default.
    fn unload(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        ctx.objects.clear(&mut *ctx.physics);
        Ok(())
    }

    /// Per-frame logic of the running level.
    fn run_logic(&mut self, _ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Holds levels and runs the current one. Jumps happen at the next update.
#[derive(Default)]
pub struct LevelManager {
    levels: Vec<Box<dyn Level>>,
    current: Option<usize>,
    pending_jump: Option<usize>,
}

impl std::fmt::Debug for LevelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelManager")
            .field("levels", &self.levels.iter().map(|l| l.name()).collect::<Vec<_>>())
            .field("current", &self.current)
            .field("pending_jump", &self.pending_jump)
            .finish()
    }
}

impl LevelManager {
    /// Creates a manager without levels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a level and returns its index.
    pub fn add_level(&mut self, level: Box<dyn Level>) -> usize {
        log::debug!("Level '{}' registered.", level.name());
        self.levels.push(level);
        self.levels.len() - 1
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether no level is registered.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the running level.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The running level.
    pub fn current(&self) -> Option<&dyn Level> {
        self.current.map(|i| self.levels[i].as_ref())
    }

    /// Requests a switch to level `index` at the next update.
    pub fn jump_to(&mut self, index: usize) -> Result<(), EngineError> {
        if index >= self.levels.len() {
            return Err(EngineError::Level(format!(
                "no level {index}, {} registered",
                self.levels.len()
            )));
        }
        self.pending_jump = Some(index);
        Ok(())
    }

    /// Requests a switch to the first level.
    pub fn jump_to_first(&mut self) -> Result<(), EngineError> {
        self.jump_to(0)
    }

    /// Whether a jump waits for the next update.
    pub fn jump_pending(&self) -> bool {
        self.pending_jump.is_some()
    }

    /// Performs a pending jump, then runs the current level's logic.
    ///
    /// A failing unload is logged and the jump proceeds; a failing load is
    /// returned. Logic errors are logged.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<(), EngineError> {
        if let Some(next) = self.pending_jump.take() {
            if let Some(current) = self.current.take() {
                let level = &mut self.levels[current];
                log::info!("Unloading level '{}'.", level.name());
                if let Err(e) = level.unload(ctx) {
                    log::error!("Unloading level '{}' failed: {e:#}", level.name());
                }
            }
            let level = &mut self.levels[next];
            log::info!("Loading level '{}'.", level.name());
            level
                .load(ctx)
                .map_err(|e| EngineError::Level(format!("loading '{}': {e:#}", level.name())))?;
            self.current = Some(next);
        }

        if let Some(current) = self.current {
            let level = &mut self.levels[current];
            if let Err(e) = level.run_logic(ctx) {
                log::error!("Level '{}' logic failed: {e:#}", level.name());
            }
        }
        Ok(())
    }
}
