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

//! Integration tests for the player body against the Rapier world.
//!
//! Each test builds its own physics world; the player is stepped the way the
//! engine does it: `engine_update` first, then the physics step.

use approx::assert_abs_diff_eq;
use veil_core::math::{BodyOrientation, Quat, Vec3, FRAC_PI_2};
use veil_core::physics::{BodyOwner, PhysicsProvider};
use veil_core::pose::Pose;
use veil_core::PlayerError;
use veil_infra::RapierPhysicsWorld;
use veil_sdk::player::{PhysicalParameters, PlayerBody, PlayerMode, WalkDirection};

const DT: f32 = 1.0 / 60.0;

/// Helper: a standing player with a body, at the default start position.
fn standing_player(physics: &mut RapierPhysicsWorld) -> PlayerBody {
    let mut player = PlayerBody::new(PhysicalParameters::default());
    player
        .set_mode(PlayerMode::Standing, physics)
        .expect("no body yet, nothing to reset");
    player.init_physics(physics).expect("body creation");
    player
}

fn run_frames(player: &mut PlayerBody, physics: &mut RapierPhysicsWorld, frames: usize) {
    for _ in 0..frames {
        player.engine_update(DT, physics).expect("engine update");
        physics.step(DT);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Standing mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_standing_player_falls_without_drifting() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    assert_eq!(player.mass(), 80.0);
    assert_eq!(player.eye_height(), 1.59);
    assert_eq!(player.position(), Vec3::new(0.0, 0.0, 10.0));

    run_frames(&mut player, &mut physics, 60);

    let position = player.position();
    assert!(position.y < 0.0, "gravity must pull the player down, got {position:?}");
    assert_abs_diff_eq!(position.x, 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(position.z, 10.0, epsilon = 1e-4);
}

#[test]
fn test_standing_position_is_read_back_from_body() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    let body = player.body().expect("body");

    for _ in 0..20 {
        player.engine_update(DT, &mut physics).expect("engine update");
        let (center, rotation) = physics.body_transform(body).expect("transform");
        let expected = center - rotation * Vec3::new(0.0, player.eye_height() / 2.0, 0.0);
        assert_abs_diff_eq!(player.position().x, expected.x, epsilon = 1e-5);
        assert_abs_diff_eq!(player.position().y, expected.y, epsilon = 1e-5);
        assert_abs_diff_eq!(player.position().z, expected.z, epsilon = 1e-5);
        physics.step(DT);
    }
}

#[test]
fn test_walking_forward_moves_along_body_heading() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    player.set_walking(WalkDirection::Forward, true);

    run_frames(&mut player, &mut physics, 30);
    let facing_north = player.position();
    assert!(facing_north.z < 10.0, "forward is -Z, got {facing_north:?}");
    assert_abs_diff_eq!(facing_north.x, 0.0, epsilon = 1e-3);

    player
        .teleport(Vec3::new(0.0, 0.0, 10.0), Some(FRAC_PI_2), &mut physics)
        .expect("teleport");
    run_frames(&mut player, &mut physics, 30);
    let turned = player.position();
    assert!(turned.x < -0.5, "a quarter turn left sends forward to -X, got {turned:?}");
    assert_abs_diff_eq!(turned.z, 10.0, epsilon = 1e-3);
}

#[test]
fn test_engine_update_without_body_is_an_error_when_standing() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = PlayerBody::new(PhysicalParameters::default());
    player
        .set_mode(PlayerMode::Standing, &mut physics)
        .expect("mode change");
    assert_eq!(
        player.engine_update(DT, &mut physics),
        Err(PlayerError::NoPhysicsBody)
    );
}

#[test]
fn test_ignore_physics_freezes_the_player() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    player.set_ignore_physics(true);

    run_frames(&mut player, &mut physics, 30);
    assert_eq!(player.position(), Vec3::new(0.0, 0.0, 10.0));
}

// ─────────────────────────────────────────────────────────────────────────────
// Room-scale mode
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_room_scale_position_follows_the_head() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    player
        .set_mode(PlayerMode::RoomScale, &mut physics)
        .expect("mode change");
    assert_eq!(player.room_base(), Vec3::new(0.0, 0.0, 10.0));

    let local = Pose::new(Vec3::new(0.3, 1.7, -0.2), Quat::from_yaw(0.4));
    for _ in 0..10 {
        player.set_tracked_head_pose(local);
        player.engine_update(DT, &mut physics).expect("engine update");

        let head = player.tracked_head_pose();
        assert_abs_diff_eq!(head.position.x, 0.3, epsilon = 1e-5);
        assert_abs_diff_eq!(head.position.z, 9.8, epsilon = 1e-5);
        assert_eq!(player.position(), Vec3::new(head.position.x, 0.0, head.position.z));

        let (center, _) = physics
            .body_transform(player.body().expect("body"))
            .expect("transform");
        assert_abs_diff_eq!(center.x, head.position.x, epsilon = 1e-5);
        assert_abs_diff_eq!(center.y, head.position.y, epsilon = 1e-5);
        assert_abs_diff_eq!(center.z, head.position.z, epsilon = 1e-5);
        physics.step(DT);
    }
}

#[test]
fn test_room_scale_walking_shifts_the_tracking_space() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    player
        .set_mode(PlayerMode::RoomScale, &mut physics)
        .expect("mode change");
    player.set_walking(WalkDirection::Forward, true);

    run_frames(&mut player, &mut physics, 60);

    // One second at walking speed, along the head's heading (-Z).
    assert_abs_diff_eq!(player.room_base().z, 10.0 - player.walk_speed(), epsilon = 1e-3);
    assert_abs_diff_eq!(player.room_base().y, 0.0);
}

#[test]
fn test_mode_change_rebuilds_a_single_body() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    let first = player.body().expect("body");

    player
        .set_mode(PlayerMode::RoomScale, &mut physics)
        .expect("mode change");
    let second = player.body().expect("body");

    assert_ne!(first, second);
    assert!(!physics.contains_body(first));
    assert_eq!(physics.bodies_owned_by(BodyOwner::Player), 1);
    assert_eq!(player.mode(), PlayerMode::RoomScale);

    // Same mode again is a no-op.
    player
        .set_mode(PlayerMode::RoomScale, &mut physics)
        .expect("mode change");
    assert_eq!(player.body().expect("body"), second);
}

// ─────────────────────────────────────────────────────────────────────────────
// Teleport and resets
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_teleport_twice_leaves_target_and_no_velocity() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);
    player.set_walking(WalkDirection::Right, true);
    run_frames(&mut player, &mut physics, 20);
    player.set_walking(WalkDirection::Right, false);

    let target = Vec3::new(4.0, 2.0, -3.0);
    for _ in 0..2 {
        player
            .teleport(target, Some(1.0), &mut physics)
            .expect("teleport");
    }

    assert_eq!(player.position(), target);
    assert_eq!(player.orientation(), BodyOrientation::from_yaw(1.0));
    let body = player.body().expect("body");
    assert_eq!(physics.linear_velocity(body), Some(Vec3::ZERO));
    assert_eq!(physics.angular_velocity(body), Some(Vec3::ZERO));
    assert_eq!(physics.bodies_owned_by(BodyOwner::Player), 1);
}

#[test]
fn test_repeated_resets_keep_exactly_one_player_body() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = standing_player(&mut physics);

    let mut previous = vec![player.body().expect("body")];
    for _ in 0..5 {
        player
            .reset_player_physics(&mut physics)
            .expect("reset");
        previous.push(player.body().expect("body"));
    }

    assert_eq!(physics.bodies_owned_by(BodyOwner::Player), 1);
    assert_eq!(physics.body_count(), 1);
    let current = player.body().expect("body");
    for old in &previous[..previous.len() - 1] {
        assert_ne!(*old, current);
        assert!(!physics.contains_body(*old), "{old:?} must be removed");
    }
}

#[test]
fn test_reset_without_body_creates_nothing() {
    let mut physics = RapierPhysicsWorld::default();
    let mut player = PlayerBody::new(PhysicalParameters::default());
    player.reset_player_physics(&mut physics).expect("reset");
    assert!(!player.has_physics());
    assert_eq!(physics.body_count(), 0);
}
