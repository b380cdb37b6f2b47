use std::time::Duration;

use crate::engine::{BaselineKey, ClockEngine, ClockError, ClockPhase, TickOutcome, Transition};
use crate::shared::constants;
use crate::store::{MatchId, MatchStore};
use crate::sync::{Clock, Ticker, TickerStats};
use crate::utils::{logger, time_utils};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub read_only: bool,
    /// Seconds put back on the clock by a reset.
    pub full_duration: u32,
    pub tick_period: Duration,
    /// Refetch cadence; `None` only sees remote changes through commits.
    pub refresh_interval: Option<Duration>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            full_duration: constants::DEFAULT_MATCH_DURATION_SECS,
            tick_period: constants::TICK_PERIOD,
            refresh_interval: Some(Duration::from_secs(constants::DEFAULT_REFRESH_INTERVAL_SECS)),
        }
    }
}

/// Result of a user intent on the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    Committed(Transition),
    /// Read-only or detached view; nothing was sent.
    Ignored,
    /// The store refused the commit; see [`MatchClockView::last_error`].
    Failed,
}

/// What is on screen, rebuilt whole for every new baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DisplayState {
    display_seconds: u32,
    baseline: BaselineKey,
}

/// One mounted view of a match clock.
///
/// Owns the tick loop for the lifetime of the view. Whenever the committed
/// state changes identity the loop is cancelled and, if the clock runs, a
/// fresh one is started against the new baseline.
pub struct MatchClockView<S: MatchStore, C: Clock> {
    engine: ClockEngine<S>,
    clock: C,
    options: ViewOptions,
    display: DisplayState,
    tick_loop: Option<Ticker>,
    refresh_timer: Option<Ticker>,
    loops_started: u64,
    last_error: Option<ClockError>,
    detached: bool,
}

impl<S: MatchStore, C: Clock> MatchClockView<S, C> {
    /// Fetch the match and start ticking if it is running.
    ///
    /// A missing match is returned as [`ClockError::NotFound`] and no tick
    /// loop is ever created. A zero tick period falls back to the default
    /// and a zero refresh interval disables refetching.
    pub fn mount(store: S, match_id: MatchId, clock: C, options: ViewOptions) -> Result<Self, ClockError> {
        let options = ViewOptions {
            tick_period: Some(options.tick_period)
                .filter(|period| !period.is_zero())
                .unwrap_or(constants::TICK_PERIOD),
            refresh_interval: options.refresh_interval.filter(|every| !every.is_zero()),
            ..options
        };
        let now = clock.now();
        let engine = ClockEngine::attach(store, match_id, options.full_duration, now)?;
        let display = DisplayState {
            display_seconds: engine.remaining_at(now),
            baseline: engine.baseline_key(),
        };
        let refresh_timer = options
            .refresh_interval
            .map(|every| Ticker::new(every, clock.instant()));

        let mut view = Self {
            engine,
            clock,
            options,
            display,
            tick_loop: None,
            refresh_timer,
            loops_started: 0,
            last_error: None,
            detached: false,
        };
        view.restart_tick_loop();
        Ok(view)
    }

    pub fn match_id(&self) -> MatchId {
        self.engine.match_id()
    }

    pub fn phase(&self) -> ClockPhase {
        self.engine.phase()
    }

    pub fn display_seconds(&self) -> u32 {
        self.display.display_seconds
    }

    pub fn formatted(&self) -> String {
        time_utils::format_clock(self.display_seconds())
    }

    pub fn is_read_only(&self) -> bool {
        self.options.read_only
    }

    /// Pause/resume/reset controls are only offered on writable views.
    pub fn controls_visible(&self) -> bool {
        !self.options.read_only && !self.detached
    }

    #[cfg(test)]
    pub fn is_ticking(&self) -> bool {
        self.tick_loop.is_some()
    }

    /// Number of tick loops started since mount.
    #[cfg(test)]
    pub fn loops_started(&self) -> u64 {
        self.loops_started
    }

    pub fn tick_stats(&self) -> Option<TickerStats> {
        self.tick_loop.as_ref().map(Ticker::stats)
    }

    pub fn last_error(&self) -> Option<&ClockError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn toggle_pause(&mut self) -> IntentOutcome {
        if !self.controls_visible() {
            return IntentOutcome::Ignored;
        }
        let result = self.engine.toggle_pause(self.clock.now());
        self.finish_intent(result)
    }

    pub fn reset(&mut self) -> IntentOutcome {
        if !self.controls_visible() {
            return IntentOutcome::Ignored;
        }
        let result = self
            .engine
            .reset(self.clock.now())
            .map(|()| Transition::Reset);
        self.finish_intent(result)
    }

    /// Refetch now instead of waiting for the refresh timer.
    pub fn refresh(&mut self) {
        if self.detached {
            return;
        }
        let now = self.clock.now();
        match self.engine.refresh(now) {
            Ok(_) => self.sync_display(),
            Err(err) => self.record_error(err),
        }
    }

    /// Run whatever is due: a refetch, a tick, or both.
    ///
    /// Returns true when the displayed value may have changed.
    pub fn poll(&mut self) -> bool {
        if self.detached {
            return false;
        }
        let at = self.clock.instant();
        let mut changed = false;

        if self.refresh_timer.as_mut().is_some_and(|t| t.poll(at)) {
            let before = self.display;
            self.refresh();
            changed |= before != self.display;
        }

        if self.tick_loop.as_mut().is_some_and(|t| t.poll(at)) {
            let before = self.display;
            self.run_tick();
            changed |= before != self.display;
        }

        changed
    }

    /// How long the host may sleep before the next poll has work to do.
    pub fn time_until_next_event(&self) -> Option<Duration> {
        let at = self.clock.instant();
        [self.tick_loop.as_ref(), self.refresh_timer.as_ref()]
            .into_iter()
            .flatten()
            .map(|t| t.time_until_next(at))
            .min()
    }

    /// Cancel every timer. The view stays readable but inert.
    pub fn detach(&mut self) {
        if self.detached {
            return;
        }
        if let Some(stats) = self.tick_stats() {
            logger::debug(&format!(
                "match {} detached after {} ticks of {:?} ({} skipped)",
                self.match_id(),
                stats.ticks_fired,
                stats.period,
                stats.ticks_skipped
            ));
        }
        self.tick_loop = None;
        self.refresh_timer = None;
        self.detached = true;
    }

    fn run_tick(&mut self) {
        let now = self.clock.now();
        let derived = match self.engine.tick(now) {
            Ok(outcome) => {
                if outcome == TickOutcome::AutoPaused {
                    logger::info(&format!("match {} ran out of time", self.match_id()));
                }
                Some(outcome.remaining())
            }
            Err(err) => {
                self.record_error(err);
                None
            }
        };
        // Same baseline: refresh the number in place. New baseline: rebuild.
        if self.display.baseline == self.engine.baseline_key() {
            self.display.display_seconds =
                derived.unwrap_or_else(|| self.engine.remaining_at(now));
        } else {
            self.sync_display();
        }
    }

    fn finish_intent(&mut self, result: Result<Transition, ClockError>) -> IntentOutcome {
        match result {
            Ok(transition) => {
                self.last_error = None;
                self.sync_display();
                IntentOutcome::Committed(transition)
            }
            Err(err) => {
                self.record_error(err);
                // Keep showing the last confirmed baseline.
                self.display.display_seconds = self.engine.remaining_at(self.clock.now());
                IntentOutcome::Failed
            }
        }
    }

    fn sync_display(&mut self) {
        let key = self.engine.baseline_key();
        let now = self.clock.now();
        if key == self.display.baseline {
            self.display.display_seconds = self.engine.remaining_at(now);
            return;
        }

        self.display = DisplayState {
            display_seconds: self.engine.remaining_at(now),
            baseline: key,
        };
        self.restart_tick_loop();
    }

    fn restart_tick_loop(&mut self) {
        // Drop the old loop before anything new can tick.
        self.tick_loop = None;
        if self.detached || self.engine.phase() == ClockPhase::Paused {
            return;
        }
        self.tick_loop = Some(Ticker::new(self.options.tick_period, self.clock.instant()));
        self.loops_started += 1;
        logger::debug(&format!(
            "match {} tick loop #{} started at {}s",
            self.match_id(),
            self.loops_started,
            self.display.display_seconds
        ));
    }

    fn record_error(&mut self, err: ClockError) {
        logger::error(&format!("match {}: {}", self.match_id(), err));
        self.last_error = Some(err);
    }
}

impl<S: MatchStore, C: Clock> Drop for MatchClockView<S, C> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FlakyStore;
    use crate::store::{InMemoryStore, MatchState, MatchUpdate};
    use crate::sync::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    const MATCH: MatchId = MatchId(7);

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        origin() + chrono::Duration::seconds(secs)
    }

    fn state(elapsed: u32, paused: bool, last: i64) -> MatchState {
        MatchState {
            match_id: MATCH,
            elapsed_seconds: elapsed,
            is_paused: paused,
            last_action_at: Some(at(last)),
        }
    }

    fn no_refresh() -> ViewOptions {
        ViewOptions {
            refresh_interval: None,
            ..ViewOptions::default()
        }
    }

    fn mount(
        initial: MatchState,
        options: ViewOptions,
    ) -> (Arc<FlakyStore>, ManualClock, MatchClockView<Arc<FlakyStore>, ManualClock>) {
        let store = Arc::new(FlakyStore::with_match(initial));
        let clock = ManualClock::starting_at(origin());
        let view = MatchClockView::mount(Arc::clone(&store), MATCH, clock.clone(), options).unwrap();
        (store, clock, view)
    }

    fn step(clock: &ManualClock, view: &mut MatchClockView<Arc<FlakyStore>, ManualClock>, secs: u64) {
        for _ in 0..secs {
            clock.advance_secs(1);
            view.poll();
        }
    }

    #[test]
    fn mount_of_missing_match_starts_nothing() {
        let clock = ManualClock::starting_at(origin());
        let result = MatchClockView::mount(InMemoryStore::new(), MATCH, clock, ViewOptions::default());
        assert!(matches!(result, Err(ClockError::NotFound(MATCH))));
    }

    #[test]
    fn running_match_is_derived_immediately_on_mount() {
        // Started 90 seconds before this view opened.
        let (_, _, view) = mount(state(1800, false, -90), no_refresh());

        assert_eq!(view.display_seconds(), 1710);
        assert_eq!(view.formatted(), "28:30");
        assert!(view.is_ticking());
    }

    #[test]
    fn paused_match_does_not_tick() {
        let (store, clock, mut view) = mount(state(1800, true, 0), no_refresh());

        step(&clock, &mut view, 30);

        assert!(!view.is_ticking());
        assert_eq!(view.display_seconds(), 1800);
        assert!(store.updates().is_empty());
    }

    #[test]
    fn ticks_follow_wall_clock() {
        let (_, clock, mut view) = mount(state(600, false, 0), no_refresh());

        step(&clock, &mut view, 3);
        assert_eq!(view.display_seconds(), 597);

        // Host stalled for 40 seconds; the next tick heals the display.
        clock.advance_secs(40);
        assert!(view.poll());
        assert_eq!(view.display_seconds(), 557);
        assert!(view.tick_stats().unwrap().ticks_skipped > 0);
    }

    #[test]
    fn toggle_commits_and_restarts_loop() {
        let (store, clock, mut view) = mount(state(1800, true, 0), no_refresh());
        assert_eq!(view.loops_started(), 0);

        clock.advance_secs(2);
        assert_eq!(view.toggle_pause(), IntentOutcome::Committed(Transition::Resume));
        assert!(view.is_ticking());
        assert_eq!(view.loops_started(), 1);

        step(&clock, &mut view, 65);
        assert_eq!(view.display_seconds(), 1735);

        assert_eq!(view.toggle_pause(), IntentOutcome::Committed(Transition::Pause));
        assert!(!view.is_ticking());
        assert_eq!(store.fetch(MATCH).unwrap().elapsed_seconds, 1735);

        step(&clock, &mut view, 10);
        assert_eq!(view.display_seconds(), 1735);
    }

    #[test]
    fn auto_pause_fires_once_and_stops_ticking() {
        let (store, clock, mut view) = mount(state(5, false, 0), no_refresh());

        step(&clock, &mut view, 12);

        assert_eq!(view.display_seconds(), 0);
        assert_eq!(view.phase(), ClockPhase::Paused);
        assert!(!view.is_ticking());
        assert_eq!(store.updates().len(), 1);
        assert_eq!(store.fetch(MATCH).unwrap().elapsed_seconds, 0);
    }

    #[test]
    fn reset_while_running_is_unconditional() {
        let (store, clock, mut view) = mount(state(500, false, 0), no_refresh());
        step(&clock, &mut view, 20);

        assert_eq!(view.reset(), IntentOutcome::Committed(Transition::Reset));

        let committed = store.fetch(MATCH).unwrap();
        assert_eq!((committed.elapsed_seconds, committed.is_paused), (1800, true));
        assert_eq!(view.display_seconds(), 1800);
        assert!(!view.is_ticking());
    }

    #[test]
    fn read_only_view_ignores_intents() {
        let options = ViewOptions {
            read_only: true,
            ..no_refresh()
        };
        let (store, clock, mut view) = mount(state(900, false, 0), options);

        assert!(!view.controls_visible());
        assert_eq!(view.toggle_pause(), IntentOutcome::Ignored);
        assert_eq!(view.reset(), IntentOutcome::Ignored);
        assert!(store.updates().is_empty());

        step(&clock, &mut view, 5);
        assert_eq!(view.display_seconds(), 895);
    }

    #[test]
    fn failed_commit_keeps_ticking_from_confirmed_baseline() {
        let (store, clock, mut view) = mount(state(300, false, 0), no_refresh());
        store.fail_updates(true);

        clock.advance_secs(10);
        assert_eq!(view.toggle_pause(), IntentOutcome::Failed);
        assert!(matches!(
            view.last_error(),
            Some(ClockError::CommitFailed { transition: Transition::Pause, .. })
        ));
        assert_eq!(view.phase(), ClockPhase::Running);
        assert_eq!(view.display_seconds(), 290);

        step(&clock, &mut view, 5);
        assert_eq!(view.display_seconds(), 285);

        store.fail_updates(false);
        assert_eq!(view.toggle_pause(), IntentOutcome::Committed(Transition::Pause));
        assert!(view.last_error().is_none());
        assert_eq!(store.fetch(MATCH).unwrap().elapsed_seconds, 285);
    }

    #[test]
    fn periodic_refresh_picks_up_remote_changes() {
        let options = ViewOptions {
            refresh_interval: Some(Duration::from_secs(5)),
            ..ViewOptions::default()
        };
        let (store, clock, mut view) = mount(state(1800, true, 0), options);

        clock.advance_secs(2);
        store.external_update(MATCH, &MatchUpdate::resume(at(2)));

        step(&clock, &mut view, 2);
        assert!(!view.is_ticking());

        step(&clock, &mut view, 1);
        assert!(view.is_ticking());
        assert_eq!(view.display_seconds(), 1797);
        assert_eq!(view.loops_started(), 1);
    }

    #[test]
    fn unchanged_refresh_does_not_restart_loop() {
        let (_, clock, mut view) = mount(state(1800, false, 0), no_refresh());

        clock.advance_secs(3);
        view.refresh();
        view.refresh();

        assert_eq!(view.loops_started(), 1);
        assert_eq!(view.display_seconds(), 1797);
    }

    #[test]
    fn refresh_failure_is_reported_but_not_fatal() {
        let (store, clock, mut view) = mount(state(60, false, 0), no_refresh());
        store.fail_fetches(true);

        view.refresh();
        assert!(matches!(view.last_error(), Some(ClockError::RefreshFailed(_))));

        step(&clock, &mut view, 4);
        assert_eq!(view.display_seconds(), 56);
    }

    #[test]
    fn two_views_of_one_match_converge_through_the_store() {
        let store = Arc::new(InMemoryStore::new());
        store.create(state(1800, true, 0)).unwrap();
        let clock = ManualClock::starting_at(origin());
        let mut table = MatchClockView::mount(Arc::clone(&store), MATCH, clock.clone(), no_refresh()).unwrap();
        let board_options = ViewOptions {
            read_only: true,
            ..no_refresh()
        };
        let mut board = MatchClockView::mount(Arc::clone(&store), MATCH, clock.clone(), board_options).unwrap();

        clock.advance_secs(1);
        table.toggle_pause();
        clock.advance_secs(30);
        table.poll();
        board.refresh();

        assert_eq!(table.display_seconds(), 1770);
        assert_eq!(board.display_seconds(), 1770);
    }

    #[test]
    fn detached_view_is_inert() {
        let (store, clock, mut view) = mount(state(100, false, 0), no_refresh());

        view.detach();
        clock.advance_secs(200);

        assert!(!view.poll());
        assert!(!view.is_ticking());
        assert_eq!(view.toggle_pause(), IntentOutcome::Ignored);
        assert_eq!(view.time_until_next_event(), None);
        assert!(store.updates().is_empty());
    }

    #[test]
    fn next_event_is_the_nearest_timer() {
        let options = ViewOptions {
            refresh_interval: Some(Duration::from_secs(5)),
            ..ViewOptions::default()
        };
        let (_, clock, mut view) = mount(state(100, true, 0), options);
        assert_eq!(view.time_until_next_event(), Some(Duration::from_secs(5)));

        view.toggle_pause();
        assert_eq!(view.time_until_next_event(), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_millis(400));
        assert_eq!(view.time_until_next_event(), Some(Duration::from_millis(600)));
    }

    #[test]
    fn zero_periods_do_not_break_mount() {
        let options = ViewOptions {
            tick_period: Duration::ZERO,
            refresh_interval: Some(Duration::ZERO),
            ..ViewOptions::default()
        };
        let (store, clock, mut view) = mount(state(100, false, 0), options);

        assert_eq!(view.time_until_next_event(), Some(Duration::from_secs(1)));
        step(&clock, &mut view, 3);
        assert_eq!(view.display_seconds(), 97);
        // No refresh timer, so the only fetch is the one made by mount.
        assert_eq!(store.fetch_count(), 1);
    }
}
