//! Commit clock.
//!
//! Every commit made in one orchestration pass shares a single timestamp,
//! passed explicitly down the call chain. The clock only supplies the
//! candidate value; [`pass_timestamp`] makes it strictly greater than every
//! earlier pass.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of Unix timestamps (seconds).
pub trait Clock {
    /// Current Unix time in seconds.
    fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Always returns the same timestamp.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Timestamp for a new pass: the clock's value, bumped past the latest
/// recorded pass so history names and commit ids never collide.
#[must_use]
pub fn pass_timestamp(clock: &dyn Clock, latest_recorded: Option<u64>) -> u64 {
    let now = clock.now();
    latest_recorded.map_or(now, |latest| now.max(latest.saturating_add(1)))
}
