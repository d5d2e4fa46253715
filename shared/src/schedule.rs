//! Cooperative periodic timer driven by the caller's tick.
//!
//! A `Periodic` never sleeps and owns no thread: the owning loop polls it
//! once per tick with the current instant and runs the periodic work when
//! `poll` returns true. Stopping it is how the work's lifetime ends.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Periodic {
    period: Duration,
    next_due: Option<Instant>,
}

impl Periodic {
    /// Creates a stopped timer.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arms the timer so the first poll at or after `now` fires. Starting an
    /// already running timer leaves its schedule alone.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now);
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns true when a firing is due and schedules the next one.
    ///
    /// Missed periods are skipped rather than replayed, so a stalled host
    /// loop produces one firing, not a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let mut next = due + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next_due = Some(next);
        true
    }
}
