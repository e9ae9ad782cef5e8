//! Mock wall clock driven by tokio time.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::trigger::Clock;

/// A wall clock that starts at a fixed instant and advances with tokio time.
///
/// Under `#[tokio::test(start_paused = true)]` the clock moves only when the
/// runtime auto-advances, so hour-long waits complete instantly and exactly.
/// [`MockClock::jump`] simulates the wall clock being stepped (NTP sync) without
/// any time passing.
#[derive(Debug)]
pub struct MockClock {
    base: DateTime<Utc>,
    started: Instant,
    skew_ms: AtomicI64,
}

impl MockClock {
    /// Create a clock reading `base` now.
    pub fn at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            started: Instant::now(),
            skew_ms: AtomicI64::new(0),
        }
    }

    /// Step the wall clock by `delta` (may be negative).
    pub fn jump(&self, delta: chrono::Duration) {
        self.skew_ms
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.base + elapsed + chrono::Duration::milliseconds(self.skew_ms.load(Ordering::SeqCst))
    }
}
