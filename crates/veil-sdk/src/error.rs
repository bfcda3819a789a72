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

use thiserror::Error;
use veil_core::{InitializationError, PlayerError};

use crate::config::ConfigError;
use crate::events::EventError;
use crate::objects::PhysicsSetupError;

/// Any failure surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A pose source or the physics world could not start or stopped working.
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    /// The player body was misused.
    #[error(transparent)]
    Player(#[from] PlayerError),
    /// The listener registry was misused.
    #[error(transparent)]
    Event(#[from] EventError),
    /// A game object's physics setup was invalid.
    #[error(transparent)]
    PhysicsSetup(#[from] PhysicsSetupError),
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A level could not be found, loaded or unloaded.
    #[error("level error: {0}")]
    Level(String),
}
