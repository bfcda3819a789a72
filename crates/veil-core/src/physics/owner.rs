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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Identifier of a trigger volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger#{}", self.0)
    }
}

const TAG_PLAYER: u64 = 1;
const TAG_OBJECT: u64 = 2;
const TAG_TRIGGER: u64 = 3;

/// What a physics body or collider stands for in the game.
///
/// Providers store it as an opaque `u128` tag (kind in the high 64 bits, id in
/// the low 64 bits) and hand it back untouched in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyOwner {
    /// Not registered with the game. Contacts involving only untagged bodies are not reported.
    #[default]
    Untagged,
    /// The player capsule.
    Player,
    /// A game object.
    Object(ObjectId),
    /// A trigger volume.
    Trigger(TriggerId),
}

impl BodyOwner {
    /// Encodes the owner into a physics user-data tag.
    pub const fn to_user_data(self) -> u128 {
        let (tag, id) = match self {
            Self::Untagged => (0, 0),
            Self::Player => (TAG_PLAYER, 0),
            Self::Object(ObjectId(id)) => (TAG_OBJECT, id),
            Self::Trigger(TriggerId(id)) => (TAG_TRIGGER, id),
        };
        ((tag as u128) << 64) | id as u128
    }

    /// Decodes a physics user-data tag. Unknown tags decode as [`BodyOwner::Untagged`].
    pub const fn from_user_data(data: u128) -> Self {
        let tag = (data >> 64) as u64;
        let id = data as u64;
        match tag {
            TAG_PLAYER => Self::Player,
            TAG_OBJECT => Self::Object(ObjectId(id)),
            TAG_TRIGGER => Self::Trigger(TriggerId(id)),
            _ => Self::Untagged,
        }
    }

    /// Whether this owner is known to the game.
    #[inline]
    pub const fn is_tagged(self) -> bool {
        !matches!(self, Self::Untagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_data_round_trip() {
        for owner in [
            BodyOwner::Untagged,
            BodyOwner::Player,
            BodyOwner::Object(ObjectId(u64::MAX)),
            BodyOwner::Trigger(TriggerId(12)),
        ] {
            assert_eq!(BodyOwner::from_user_data(owner.to_user_data()), owner);
        }
    }

    #[test]
    fn test_unknown_tag_is_untagged() {
        assert_eq!(BodyOwner::from_user_data(99u128 << 64), BodyOwner::Untagged);
    }
}
