//! Timestamp sources.
//!
//! Versions are ordered by `created_at`, so the engine stamps them from a
//! clock that never repeats or goes backwards within a process.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock microseconds, bumped by one when the wall clock stalls or
/// steps back: `next = max(now, last + 1)`.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_us: AtomicI64,
}

impl MonotonicClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_us: AtomicI64::new(0),
        }
    }

    /// Seed with the newest timestamp already on record, e.g. after replay.
    pub fn observe(&self, seen: DateTime<Utc>) {
        self.last_us.fetch_max(seen.timestamp_micros(), Ordering::SeqCst);
    }

    fn next_micros(&self, wall: i64) -> i64 {
        let mut last = self.last_us.load(Ordering::SeqCst);
        loop {
            let next = wall.max(last + 1);
            match self
                .last_us
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let us = self.next_micros(Utc::now().timestamp_micros());
        DateTime::from_timestamp_micros(us).unwrap_or_else(Utc::now)
    }
}

/// Deterministic clock: starts at `start` and advances `step_us` per call.
#[derive(Debug)]
pub struct SteppedClock {
    next_us: AtomicI64,
    step_us: i64,
}

impl SteppedClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>, step_us: i64) -> Self {
        Self {
            next_us: AtomicI64::new(start.timestamp_micros()),
            step_us,
        }
    }
}

impl Clock for SteppedClock {
    fn now(&self) -> DateTime<Utc> {
        let us = self.next_us.fetch_add(self.step_us, Ordering::SeqCst);
        DateTime::from_timestamp_micros(us).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monotonic_never_repeats() {
        let clock = MonotonicClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn monotonic_survives_wall_clock_stall() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.next_micros(100), 100);
        assert_eq!(clock.next_micros(100), 101);
        assert_eq!(clock.next_micros(50), 102);
        assert_eq!(clock.next_micros(500), 500);
    }

    #[test]
    fn observe_moves_floor_forward() {
        let clock = MonotonicClock::new();
        let future = Utc.timestamp_opt(4_000_000_000, 0).unwrap();
        clock.observe(future);
        assert!(clock.now() > future);
    }

    #[test]
    fn stepped_clock_is_deterministic() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let clock = SteppedClock::new(start, 1_000_000);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), Utc.timestamp_opt(1_700_000_001, 0).unwrap());
    }
}
