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

use veil_core::event::TimerId;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    id: TimerId,
    due: f64,
}

/// One-shot timers, split between a staging list and the active list.
///
/// New timers always land in staging; they only become eligible to fire after
/// the next [`TimerQueue::promote`], so a timer created while expired timers
/// are being dispatched can never fire in that same pass.
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    staging: Vec<Timer>,
    active: Vec<Timer>,
    next_id: u64,
}

impl TimerQueue {
    /// Schedules a timer due `delay` seconds after `now`.
    pub(crate) fn schedule(&mut self, now: f64, delay: f64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = now + delay.max(0.0);
        log::trace!("Timer {id:?} scheduled for t = {due:.4}.");
        self.staging.push(Timer { id, due });
        id
    }

    /// Moves every staged timer to the active list.
    pub(crate) fn promote(&mut self) {
        self.active.append(&mut self.staging);
    }

    /// Removes and returns the active timers due at `now`, earliest first.
    pub(crate) fn take_expired(&mut self, now: f64) -> Vec<TimerId> {
        let mut expired: Vec<Timer> = Vec::new();
        self.active.retain(|timer| {
            if now >= timer.due {
                expired.push(*timer);
                false
            } else {
                true
            }
        });
        expired.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        expired.into_iter().map(|timer| timer.id).collect()
    }

    /// Staged plus active timers.
    pub(crate) fn len(&self) -> usize {
        self.staging.len() + self.active.len()
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_timers_do_not_fire_before_promotion() {
        let mut queue = TimerQueue::default();
        queue.schedule(0.0, 0.0);
        assert!(queue.take_expired(10.0).is_empty());
        queue.promote();
        assert_eq!(queue.take_expired(10.0), vec![TimerId(0)]);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_expired_timers_come_out_in_due_order() {
        let mut queue = TimerQueue::default();
        let late = queue.schedule(0.0, 2.0);
        let early = queue.schedule(0.0, 1.0);
        queue.promote();
        assert!(queue.take_expired(0.5).is_empty());
        assert_eq!(queue.take_expired(5.0), vec![early, late]);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut queue = TimerQueue::default();
        let a = queue.schedule(0.0, 1.0);
        let b = queue.schedule(0.0, 1.0);
        assert!(b > a);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.active_len(), 0);
    }
}
