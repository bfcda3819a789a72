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

use std::cell::RefCell;
use std::rc::Rc;

use veil_core::error::InitializationError;
use veil_core::math::{Quat, Vec3};
use veil_core::pose::{
    CameraRig, HandControllerState, Pose, PoseSource, TrackingSample, VrBackend,
};

#[derive(Debug)]
struct HeadsetScript {
    head: Pose,
    hands: Vec<HandControllerState>,
    delta_time: f64,
    failure: Option<String>,
}

/// Drives a [`SimulatedHeadset`] after it has been handed to the engine.
#[derive(Debug, Clone)]
pub struct HeadsetControl(Rc<RefCell<HeadsetScript>>);

impl HeadsetControl {
    /// Moves the tracked head, in tracking space.
    pub fn set_head_pose(&self, head: Pose) {
        self.0.borrow_mut().head = head;
    }

    /// Replaces the tracked hand controllers, poses in tracking space.
    pub fn set_hands(&self, hands: Vec<HandControllerState>) {
        self.0.borrow_mut().hands = hands;
    }

    /// Changes the delta reported per frame.
    pub fn set_delta_time(&self, delta_time: f64) {
        self.0.borrow_mut().delta_time = delta_time;
    }

    /// Makes every following `acquire` fail as if the session was lost.
    pub fn disconnect(&self, reason: impl Into<String>) {
        self.0.borrow_mut().failure = Some(reason.into());
    }

    /// Restores the session.
    pub fn reconnect(&self) {
        self.0.borrow_mut().failure = None;
    }
}

/// A scripted headset with a fixed frame time.
///
/// Stands in for a room-scale runtime in headless runs and tests: the head
/// pose and hands are whatever the [`HeadsetControl`] last set.
#[derive(Debug)]
pub struct SimulatedHeadset {
    script: Rc<RefCell<HeadsetScript>>,
    yaw_offset: Quat,
    frame: u64,
}

impl SimulatedHeadset {
    /// A headset standing still at the origin of tracking space.
    pub fn new(delta_time: f64) -> Self {
        Self {
            script: Rc::new(RefCell::new(HeadsetScript {
                head: Pose::IDENTITY,
                hands: Vec::new(),
                delta_time,
                failure: None,
            })),
            yaw_offset: Quat::IDENTITY,
            frame: 0,
        }
    }

    /// A handle to script this headset.
    pub fn control(&self) -> HeadsetControl {
        HeadsetControl(Rc::clone(&self.script))
    }

    fn recentered(&self, pose: &Pose) -> Pose {
        Pose::new(
            self.yaw_offset * pose.position,
            self.yaw_offset * pose.orientation,
        )
    }
}

impl PoseSource for SimulatedHeadset {
    fn backend(&self) -> VrBackend {
        VrBackend::Simulated
    }

    fn acquire(&mut self, rig: &CameraRig) -> Result<TrackingSample, InitializationError> {
        let script = self.script.borrow();
        if let Some(reason) = &script.failure {
            return Err(InitializationError::SessionLost(reason.clone()));
        }
        self.frame += 1;

        let hands = script
            .hands
            .iter()
            .map(|hand| HandControllerState {
                pose: rig.to_world(&self.recentered(&hand.pose)),
                linear_velocity: rig.orientation * (self.yaw_offset * hand.linear_velocity),
                ..hand.clone()
            })
            .collect();

        Ok(TrackingSample {
            head: self.recentered(&script.head),
            delta_time: script.delta_time,
            frame: self.frame,
            hands,
        })
    }

    fn recenter(&mut self) {
        let head = self.script.borrow().head;
        self.yaw_offset = Quat::from_yaw(-head.orientation.yaw());
        log::debug!("Simulated headset recentered (yaw offset {:?}).", self.yaw_offset);
    }

    fn frame_count(&self) -> u64 {
        self.frame
    }
}

impl Default for SimulatedHeadset {
    fn default() -> Self {
        Self::new(1.0 / 90.0)
    }
}
