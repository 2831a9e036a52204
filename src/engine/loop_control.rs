use std::time::{Duration, Instant};

use crate::config::RunLimits;

/// Round-robin cursor over the chat slots plus the optional stop conditions.
pub struct LoopController {
    limits: RunLimits,
    start_time: Instant,
    slot_count: usize,
    next_slot: usize,
    steps: u64,
}

impl LoopController {
    pub fn new(slot_count: usize, limits: RunLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
            slot_count,
            next_slot: 0,
            steps: 0,
        }
    }

    /// Returns the slot to visit now and advances the cursor, wrapping to 0.
    pub fn advance(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot = (self.next_slot + 1) % self.slot_count.max(1);
        self.steps += 1;
        slot
    }

    /// Full passes over all slots finished so far.
    pub fn completed_cycles(&self) -> u64 {
        self.steps / self.slot_count.max(1) as u64
    }

    /// Zero-based pass the most recent visit belongs to.
    pub fn current_cycle(&self) -> u64 {
        self.steps.saturating_sub(1) / self.slot_count.max(1) as u64
    }

    pub fn should_stop(&self) -> bool {
        if let Some(max) = self.limits.max_cycles {
            if self.completed_cycles() >= max {
                return true;
            }
        }
        if let Some(max_min) = self.limits.max_duration_minutes {
            if self.start_time.elapsed() >= Duration::from_secs(max_min.saturating_mul(60)) {
                return true;
            }
        }
        false
    }
}
