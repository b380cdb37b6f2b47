use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Authoritative clock state of one match, as persisted by the store.
///
/// While paused, `elapsed_seconds` is exactly the time remaining. While
/// running it is a baseline: the remaining time is that baseline minus the
/// wall-clock seconds since `last_action_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub match_id: MatchId,
    pub elapsed_seconds: u32,
    pub is_paused: bool,
    #[serde(default)]
    pub last_action_at: Option<DateTime<Utc>>,
}

impl MatchState {
    /// A freshly created match: paused with the full duration on the clock.
    pub fn new(match_id: MatchId, duration_secs: u32, created_at: DateTime<Utc>) -> Self {
        Self {
            match_id,
            elapsed_seconds: duration_secs,
            is_paused: true,
            last_action_at: Some(created_at),
        }
    }
}

/// Partial update sent to the store.
///
/// Only the transition constructors build one, so `elapsed_seconds` is never
/// written without `last_action_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_paused: Option<bool>,
    last_action_at: DateTime<Utc>,
}

impl MatchUpdate {
    /// Start running from the stored baseline.
    pub fn resume(at: DateTime<Utc>) -> Self {
        Self {
            elapsed_seconds: None,
            is_paused: Some(false),
            last_action_at: at,
        }
    }

    /// Stop the clock with `remaining` as the new exact value.
    pub fn pause(remaining: u32, at: DateTime<Utc>) -> Self {
        Self {
            elapsed_seconds: Some(remaining),
            is_paused: Some(true),
            last_action_at: at,
        }
    }

    /// Put the full duration back on a stopped clock.
    pub fn reset(duration_secs: u32, at: DateTime<Utc>) -> Self {
        Self::pause(duration_secs, at)
    }

    #[cfg(test)]
    pub fn elapsed_seconds(&self) -> Option<u32> {
        self.elapsed_seconds
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> Option<bool> {
        self.is_paused
    }

    #[cfg(test)]
    pub fn last_action_at(&self) -> DateTime<Utc> {
        self.last_action_at
    }

    /// The full state after applying this update to `state`.
    pub fn apply_to(&self, state: &MatchState) -> MatchState {
        MatchState {
            match_id: state.match_id,
            elapsed_seconds: self.elapsed_seconds.unwrap_or(state.elapsed_seconds),
            is_paused: self.is_paused.unwrap_or(state.is_paused),
            last_action_at: Some(self.last_action_at),
        }
    }
}
