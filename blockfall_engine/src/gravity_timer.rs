use std::time::Duration;

use crate::GameTime;

/// A cancellable repeating timer driven by engine time.
///
/// At most one tick is ever scheduled: (re)starting replaces the pending tick instead of adding
/// a second one.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GravityTimer {
    interval: Duration,
    next_tick: Option<GameTime>,
}

impl GravityTimer {
    pub fn new(interval: Duration) -> Self {
        assert!(!interval.is_zero(), "gravity interval must be positive");
        Self {
            interval,
            next_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_tick(&self) -> Option<GameTime> {
        self.next_tick
    }

    pub fn is_active(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn start(&mut self, now: GameTime) {
        self.next_tick = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    /// Changes the interval, rescheduling from `now` if the timer is running.
    pub fn set_interval(&mut self, interval: Duration, now: GameTime) {
        assert!(!interval.is_zero(), "gravity interval must be positive");
        self.interval = interval;
        if self.is_active() {
            self.start(now);
        }
    }

    /// Consumes one tick due at or before `now`, scheduling the following one, and returns its time.
    pub fn fire_due(&mut self, now: GameTime) -> Option<GameTime> {
        let due = self.next_tick.filter(|&tick| tick <= now)?;
        self.next_tick = Some(due + self.interval);
        Some(due)
    }
}
