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

//! Physics debug overlay: collider bounding boxes as line segments.

use rapier3d::prelude::*;
use veil_core::math::Vec3;
use veil_core::physics::DebugLine;

/// Appends the 12 edges of every collider's world-space bounding box.
pub fn collect_aabb_lines(colliders: &ColliderSet, lines: &mut Vec<DebugLine>) {
    lines.clear();
    for (_, collider) in colliders.iter() {
        let aabb = collider.compute_aabb();
        let min = Vec3::new(aabb.mins.x, aabb.mins.y, aabb.mins.z);
        let max = Vec3::new(aabb.maxs.x, aabb.maxs.y, aabb.maxs.z);
        push_box_edges(min, max, lines);
    }
}

fn push_box_edges(min: Vec3, max: Vec3, lines: &mut Vec<DebugLine>) {
    let corner = |i: u8| {
        Vec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };
    // Two corners share an edge when their indices differ by exactly one bit.
    for a in 0u8..8 {
        for bit in [1u8, 2, 4] {
            let b = a | bit;
            if b != a {
                lines.push(DebugLine {
                    start: corner(a),
                    end: corner(b),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_has_twelve_edges() {
        let mut lines = Vec::new();
        push_box_edges(Vec3::ZERO, Vec3::ONE, &mut lines);
        assert_eq!(lines.len(), 12);
        for line in &lines {
            assert!((line.end - line.start).length() > 0.0);
        }
    }
}
