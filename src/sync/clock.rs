use chrono::{DateTime, Utc};
use std::time::Instant;

/// Source of time for a mounted clock view.
///
/// Wall time feeds derivation and commit timestamps; the monotonic instant
/// only paces the tick loop and never reaches the store.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;
}

/// The real clocks of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
