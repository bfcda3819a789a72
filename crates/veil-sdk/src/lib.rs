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

//! The engine proper.
//!
//! Builds on the contracts of `veil-core` and the backends of `veil-infra` to
//! provide the player body, the event manager, game objects, levels and the
//! frame loop tying them together. Most applications only need the
//! [`prelude`].

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod levels;
pub mod objects;
pub mod player;

pub use config::{ConfigError, EngineConfig, InputConfig, PlayerConfig, PlayerTuning};
pub use engine::{run_windowed, Engine, FrameContext, FrameInfo, FrameSink, FrameView, Subsystem};
pub use error::EngineError;
pub use events::{
    DefaultEventListener, EventContext, EventError, EventListener, EventManager, FrameEvents,
    ListenerHandle,
};
pub use levels::{Level, LevelManager};
pub use objects::{GameObject, GameObjectManager, PhysicsSetupError, TriggerObject};
pub use player::{PlayerActuator, PlayerBody, PlayerMode, WalkDirection};

/// Re-exports commonly needed to write a level or a listener.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::{Engine, FrameContext, FrameSink, FrameView, Subsystem};
    pub use crate::events::{DefaultEventListener, EventContext, EventListener};
    pub use crate::levels::Level;
    pub use crate::player::{PlayerBody, PlayerMode, WalkDirection};
    pub use veil_core::event::{
        CollisionEvent, ControllerEvent, HandControllerEvent, KeyEvent, MouseEvent,
        PlayerCollisionEvent, TimeEvent, TriggerEvent, UserEvent,
    };
    pub use veil_core::input::KeyCode;
    pub use veil_core::math::{BodyOrientation, Quat, Vec3};
    pub use veil_core::physics::{BodyOwner, ColliderShape, ObjectId, PhysicsProvider, TriggerId};
    pub use veil_core::pose::{Pose, VrBackend};
}
