use chrono::{DateTime, Utc};

use super::baseline::{Baseline, BaselineKey, ClockPhase};
use super::error::{ClockError, Transition};
use crate::store::{MatchId, MatchState, MatchStore, MatchUpdate, StoreError};
use crate::utils::logger;

/// What a single tick of the running clock produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock is paused; nothing to derive.
    Idle { remaining: u32 },
    Running { remaining: u32 },
    /// Time ran out and the auto-pause commit was saved.
    AutoPaused,
    /// Time ran out but another client changed the match first; its state
    /// was adopted instead of writing.
    Superseded { remaining: u32 },
}

impl TickOutcome {
    pub fn remaining(self) -> u32 {
        match self {
            TickOutcome::Idle { remaining }
            | TickOutcome::Running { remaining }
            | TickOutcome::Superseded { remaining } => remaining,
            TickOutcome::AutoPaused => 0,
        }
    }
}

/// Reconciles one match clock against its store.
///
/// Holds the last state confirmed by the store and derives the remaining
/// time from it on demand. Every transition is pushed through the store and
/// the state it returns becomes the new baseline; nothing is mutated locally.
#[derive(Debug)]
pub struct ClockEngine<S: MatchStore> {
    store: S,
    match_id: MatchId,
    full_duration: u32,
    state: MatchState,
    baseline: Baseline,
    auto_paused: bool,
}

impl<S: MatchStore> ClockEngine<S> {
    /// Fetch `match_id` and reconcile against it.
    ///
    /// # Parameters
    /// - `full_duration`: seconds restored by [`reset`](Self::reset).
    /// - `now`: current wall time, used to anchor a state with no recorded action.
    pub fn attach(
        store: S,
        match_id: MatchId,
        full_duration: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ClockError> {
        let state = store.fetch(match_id).map_err(|err| match err {
            StoreError::NotFound(id) => ClockError::NotFound(id),
            source => ClockError::Attach { id: match_id, source },
        })?;

        logger::info(&format!(
            "attached to match {}: {} ({}s)",
            match_id,
            ClockPhase::of(&state).label(),
            state.elapsed_seconds
        ));

        Ok(Self {
            baseline: Baseline::adopt(&state, now),
            store,
            match_id,
            full_duration,
            state,
            auto_paused: false,
        })
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Last state confirmed by the store.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> ClockPhase {
        self.baseline.phase()
    }

    pub fn baseline_key(&self) -> BaselineKey {
        self.baseline.key()
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        self.baseline.remaining_at(now)
    }

    /// Replace the baseline with `state` if it differs from the current one.
    ///
    /// Returns true when a new baseline was established.
    pub fn adopt(&mut self, state: MatchState, now: DateTime<Utc>) -> bool {
        let key = BaselineKey::of(&state);
        if key == self.baseline.key() {
            return false;
        }

        logger::debug(&format!(
            "match {} new baseline: {} at {}s",
            self.match_id,
            ClockPhase::of(&state).label(),
            state.elapsed_seconds
        ));

        self.baseline = Baseline::adopt(&state, now);
        self.state = state;
        self.auto_paused = false;
        true
    }

    /// Refetch the match and adopt whatever the store holds now.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Result<bool, ClockError> {
        let state = self
            .store
            .fetch(self.match_id)
            .map_err(ClockError::RefreshFailed)?;
        Ok(self.adopt(state, now))
    }

    /// Derive the remaining time and fire auto-pause when it reaches zero.
    ///
    /// Auto-pause is issued at most once per baseline: the guard is set
    /// before the write and cleared only by a new baseline, so a failed
    /// commit is reported once and not retried by later ticks.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, ClockError> {
        let remaining = self.baseline.remaining_at(now);
        if self.phase() == ClockPhase::Paused {
            return Ok(TickOutcome::Idle { remaining });
        }
        if remaining > 0 || self.auto_paused {
            return Ok(TickOutcome::Running { remaining });
        }

        self.auto_paused = true;

        // Another client may have paused, resumed or reset since our last
        // fetch. Their write is newer than our derivation, so it wins.
        match self.store.fetch(self.match_id) {
            Ok(latest) if BaselineKey::of(&latest) != self.baseline.key() => {
                logger::info(&format!(
                    "match {} changed remotely before auto-pause; adopting it",
                    self.match_id
                ));
                self.adopt(latest, now);
                return Ok(TickOutcome::Superseded {
                    remaining: self.baseline.remaining_at(now),
                });
            }
            Ok(_) => {}
            Err(err) => logger::error(&format!(
                "match {} pre-auto-pause fetch failed, committing anyway: {}",
                self.match_id, err
            )),
        }

        let at = self.commit_instant(now);
        self.commit(Transition::AutoPause, MatchUpdate::pause(0, at), now)?;
        Ok(TickOutcome::AutoPaused)
    }

    /// Resume when paused, pause when running.
    pub fn toggle_pause(&mut self, now: DateTime<Utc>) -> Result<Transition, ClockError> {
        match self.phase() {
            ClockPhase::Paused => {
                self.resume(now)?;
                Ok(Transition::Resume)
            }
            ClockPhase::Running => {
                self.pause(now)?;
                Ok(Transition::Pause)
            }
        }
    }

    /// `PAUSED → RUNNING`. The stored remaining time becomes the baseline.
    ///
    /// Returns false without writing when the clock is already running.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<bool, ClockError> {
        if self.phase() == ClockPhase::Running {
            return Ok(false);
        }
        let at = self.commit_instant(now);
        self.commit(Transition::Resume, MatchUpdate::resume(at), now)?;
        Ok(true)
    }

    /// `RUNNING → PAUSED`, committing the derived remaining time.
    ///
    /// Returns false without writing when the clock is already paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<bool, ClockError> {
        if self.phase() == ClockPhase::Paused {
            return Ok(false);
        }
        let at = self.commit_instant(now);
        let remaining = self.baseline.remaining_at(at);
        self.commit(Transition::Pause, MatchUpdate::pause(remaining, at), now)?;
        Ok(true)
    }

    /// Stop the clock with the full duration on it, whatever its state.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Result<(), ClockError> {
        let at = self.commit_instant(now);
        self.commit(Transition::Reset, MatchUpdate::reset(self.full_duration, at), now)
    }

    // `last_action_at` never moves backwards, even when the local clock
    // trails the timestamp another client wrote.
    fn commit_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.state.last_action_at {
            Some(last) if last > now => last,
            _ => now,
        }
    }

    fn commit(
        &mut self,
        transition: Transition,
        update: MatchUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), ClockError> {
        match self.store.update(self.match_id, &update) {
            Ok(state) => {
                logger::info(&format!(
                    "match {} {} committed: {}s, paused={}",
                    self.match_id, transition, state.elapsed_seconds, state.is_paused
                ));
                self.adopt(state, now);
                Ok(())
            }
            Err(source) => {
                logger::error(&format!(
                    "match {} {} failed: {}",
                    self.match_id, transition, source
                ));
                Err(ClockError::CommitFailed { transition, source })
            }
        }
    }
}
