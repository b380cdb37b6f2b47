use chrono::{DateTime, Utc};

use crate::store::MatchState;
use crate::utils::time_utils::{remaining_after, seconds_between};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    Running,
    Paused,
}

impl ClockPhase {
    pub fn of(state: &MatchState) -> Self {
        if state.is_paused {
            ClockPhase::Paused
        } else {
            ClockPhase::Running
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClockPhase::Running => "RUNNING",
            ClockPhase::Paused => "PAUSED",
        }
    }
}

/// Identity of a committed state. A new key means a new baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineKey {
    elapsed_seconds: u32,
    is_paused: bool,
    last_action_at: Option<DateTime<Utc>>,
}

impl BaselineKey {
    pub fn of(state: &MatchState) -> Self {
        Self {
            elapsed_seconds: state.elapsed_seconds,
            is_paused: state.is_paused,
            last_action_at: state.last_action_at,
        }
    }
}

/// The `(elapsed_seconds, anchor)` pair remaining time is derived from.
///
/// `anchor` is the committed `last_action_at`. A state that never recorded
/// one is anchored at the instant it was adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    key: BaselineKey,
    elapsed_seconds: u32,
    phase: ClockPhase,
    anchor: DateTime<Utc>,
}

impl Baseline {
    pub fn adopt(state: &MatchState, adopted_at: DateTime<Utc>) -> Self {
        Self {
            key: BaselineKey::of(state),
            elapsed_seconds: state.elapsed_seconds,
            phase: ClockPhase::of(state),
            anchor: state.last_action_at.unwrap_or(adopted_at),
        }
    }

    pub fn key(&self) -> BaselineKey {
        self.key
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Remaining seconds at `now`. Paused baselines are exact.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        match self.phase {
            ClockPhase::Paused => self.elapsed_seconds,
            ClockPhase::Running => {
                remaining_after(self.elapsed_seconds, seconds_between(self.anchor, now))
            }
        }
    }
}

/// Remaining seconds of `state` at `now`, with no engine involved.
///
/// A running state with no recorded action has nothing to count from and
/// shows its baseline.
pub fn derive_remaining(state: &MatchState, now: DateTime<Utc>) -> u32 {
    Baseline::adopt(state, now).remaining_at(now)
}
