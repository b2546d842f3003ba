//! Deterministic clock for tests.

use chrono::{DateTime, Utc};
use questline_core::clock::Clock;

/// A clock pinned to a single instant, so quest-availability windows and
/// event timestamps are reproducible in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
