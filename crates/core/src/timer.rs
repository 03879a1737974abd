//! Round timer - a 60 second countdown
//!
//! `Inactive -> Running` on round start, `Running -> Expired` when the
//! count reaches zero, `Running -> Inactive` when the round is solved.
//! Starting always resets to a fresh `Running` timer.
//!
//! The frontend loop runs at millisecond resolution; [`RoundTimer::advance`]
//! accumulates elapsed milliseconds and emits one tick per second.

use crate::types::{TimerState, ROUND_TIME_SECS, SECOND_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundTimer {
    state: TimerState,
    remaining: u32,
    /// Milliseconds accumulated toward the next tick.
    carry_ms: u32,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Inactive,
            remaining: ROUND_TIME_SECS,
            carry_ms: 0,
        }
    }

    pub fn start(&mut self) {
        self.state = TimerState::Running;
        self.remaining = ROUND_TIME_SECS;
        self.carry_ms = 0;
    }

    /// Stop without expiring (round solved). Remaining time is kept.
    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Inactive;
            self.carry_ms = 0;
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// One time unit elapsed. Returns true if this tick expired the timer.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = TimerState::Expired;
            self.carry_ms = 0;
            return true;
        }
        false
    }

    /// Feed elapsed wall time. Returns true if the timer expired.
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.carry_ms = self.carry_ms.saturating_add(elapsed_ms);
        while self.carry_ms >= SECOND_MS {
            self.carry_ms -= SECOND_MS;
            if self.tick() {
                return true;
            }
        }
        false
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new()
    }
}
