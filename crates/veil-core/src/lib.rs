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

//! # Veil Core
//!
//! Foundational crate containing the traits, value types and interface
//! contracts the rest of the engine is built against: pose and timing
//! sources, physics providers, raw input devices and the event vocabulary.

#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod input;
pub mod math;
pub mod physics;
pub mod pose;
pub mod utils;

pub use error::{InitializationError, PlayerError};
pub use utils::timer::Stopwatch;
