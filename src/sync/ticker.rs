use std::time::{Duration, Instant};

/// Fixed-period tick pacer for a host loop.
///
/// Ticks are not promised to land on exact period boundaries. When the host
/// falls more than a few periods behind, the missed ticks are counted as
/// skipped and the schedule restarts from `now` instead of firing a burst.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_tick: Instant,
    ticks_fired: u64,
    ticks_skipped: u64,
}

const RESYNC_AFTER_PERIODS: u32 = 3;

impl Ticker {
    /// Start a ticker whose first tick is one period after `now`.
    pub fn new(period: Duration, now: Instant) -> Self {
        assert!(!period.is_zero(), "tick period must be greater than zero");
        Self {
            period,
            next_tick: now + period,
            ticks_fired: 0,
            ticks_skipped: 0,
        }
    }

    /// How long the host may wait before the next tick is due.
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_tick.saturating_duration_since(now)
    }

    /// Returns true when a tick is due at `now`, consuming it.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }

        let behind = now.duration_since(self.next_tick);
        if behind > self.period * RESYNC_AFTER_PERIODS {
            let missed = (behind.as_nanos() / self.period.as_nanos()) as u64;
            self.ticks_skipped += missed;
            self.next_tick = now + self.period;
        } else {
            self.next_tick += self.period;
        }

        self.ticks_fired += 1;
        true
    }

    pub fn stats(&self) -> TickerStats {
        TickerStats {
            ticks_fired: self.ticks_fired,
            ticks_skipped: self.ticks_skipped,
            period: self.period,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerStats {
    pub ticks_fired: u64,
    pub ticks_skipped: u64,
    pub period: Duration,
}
