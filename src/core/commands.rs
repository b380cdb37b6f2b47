use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::engine::{derive_remaining, ClockEngine, ClockPhase, Transition};
use crate::store::{MatchId, MatchState, MatchStore};
use crate::utils::time_utils;

/// Create a paused match with `duration_secs` on the clock.
///
/// Without an explicit id the next free one after the highest stored id is
/// used.
pub fn create_match<S: MatchStore>(
    store: &S,
    id: Option<u64>,
    duration_secs: u32,
    now: DateTime<Utc>,
) -> Result<MatchState> {
    let id = match id {
        Some(id) => MatchId(id),
        None => {
            let highest = store
                .list()
                .context("failed to list matches")?
                .iter()
                .map(|state| state.match_id.0)
                .max()
                .unwrap_or(0);
            MatchId(highest + 1)
        }
    };

    let created = store
        .create(MatchState::new(id, duration_secs, now))
        .with_context(|| format!("failed to create match {}", id))?;
    crate::utils::logger::info(&format!("created match {} ({}s)", id, duration_secs));
    Ok(created)
}

/// One summary line per match, as of `now`.
pub fn list_lines<S: MatchStore>(store: &S, now: DateTime<Utc>) -> Result<Vec<String>> {
    let matches = store.list().context("failed to list matches")?;
    Ok(matches.iter().map(|state| summary_line(state, now)).collect())
}

pub fn summary_line(state: &MatchState, now: DateTime<Utc>) -> String {
    format!(
        "{:<6} {:>8}  {}",
        state.match_id.to_string(),
        time_utils::format_clock(derive_remaining(state, now)),
        ClockPhase::of(state).label()
    )
}

/// Flip a match between running and paused, as a control view would.
pub fn toggle_match<S: MatchStore>(
    store: S,
    id: MatchId,
    full_duration: u32,
    now: DateTime<Utc>,
) -> Result<(Transition, MatchState)> {
    let mut engine = ClockEngine::attach(store, id, full_duration, now)?;
    let transition = engine.toggle_pause(now)?;
    Ok((transition, engine.state().clone()))
}

/// Put `full_duration` back on the clock, paused.
pub fn reset_match<S: MatchStore>(
    store: S,
    id: MatchId,
    full_duration: u32,
    now: DateTime<Utc>,
) -> Result<MatchState> {
    let mut engine = ClockEngine::attach(store, id, full_duration, now)?;
    engine.reset(now)?;
    Ok(engine.state().clone())
}
