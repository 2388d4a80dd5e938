//! Timer engine
//!
//! A synchronous state machine over [`TimerState`], [`DayRecord`] and
//! [`Settings`]. It never reads a clock and never sleeps: callers pass the
//! current time in and drive `tick` once per second while running.
//!
//! ```text
//! Ready --start_day--> Focus --complete--> ShortBreak --complete--> Focus ...
//!                      Focus --complete (N-th)--> LongBreak --complete--> Focus
//! ```
//!
//! Scheduled callbacks are guarded by tokens. Every `start` issues a fresh
//! [`CountdownToken`] and every completion that wants an automatic restart
//! issues an [`AutoStartTicket`]. A tick or auto-start carrying a token that
//! is no longer current is ignored, so a pause or reset can never be undone
//! by a callback that was already in flight.

pub mod reconcile;

pub use reconcile::{elapsed_seconds, CatchUpPolicy, RestoreOutcome, ResyncOutcome};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    error::EngineError,
    state::{
        DayRecord, DaySummary, DisplayState, Durations, Mode, PersistedSnapshot, Settings,
        SettingsUpdate, TimerState,
    },
};

/// Grace delay before an automatic start, in seconds
pub const AUTO_PROGRESS_DELAY_SECS: u64 = 1;

/// Identifies one run of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountdownToken(u64);

/// Identifies one scheduled automatic start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AutoStartTicket(u64);

/// Result of finishing an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub finished: Mode,
    pub next: Mode,
    /// Set when auto-progress scheduled a start after the grace delay
    pub auto_start: Option<AutoStartTicket>,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The token no longer matches a running countdown
    Stale,
    /// One second was taken off the countdown
    Counted { remaining_seconds: u64 },
    Completed(Completion),
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    timer: TimerState,
    day: DayRecord,
    settings: Settings,
    durations: Durations,
    countdown: Option<CountdownToken>,
    pending_auto_start: Option<AutoStartTicket>,
    next_token: u64,
}

impl TimerEngine {
    /// Fresh engine in Ready mode with default settings
    pub fn new(durations: Durations) -> Self {
        Self::with_settings(durations, Settings::default())
    }

    pub fn with_settings(durations: Durations, settings: Settings) -> Self {
        Self {
            timer: TimerState::new(&durations),
            day: DayRecord::default(),
            settings,
            durations,
            countdown: None,
            pending_auto_start: None,
            next_token: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn day(&self) -> &DayRecord {
        &self.day
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    pub fn is_running(&self) -> bool {
        self.timer.running
    }

    /// Token of the live countdown, if running
    pub fn countdown_token(&self) -> Option<CountdownToken> {
        self.countdown
    }

    /// Ticket of the automatic start waiting for its grace delay
    pub fn pending_auto_start(&self) -> Option<AutoStartTicket> {
        self.pending_auto_start
    }

    /// Project the current state for rendering
    pub fn display(&self) -> DisplayState {
        let (minutes, seconds) = self.timer.minutes_seconds();
        DisplayState {
            minutes,
            seconds,
            clock: format!("{:02}:{:02}", minutes, seconds),
            mode: self.timer.mode,
            mode_label: self.timer.mode.label().to_string(),
            running: self.timer.running,
            interval_progress: self.timer.elapsed_fraction(),
            day_active: self.day.active,
            completed_focus_sessions: self.day.completed_focus_sessions,
            completed_long_breaks: self.day.completed_long_breaks,
            progress_fraction: self.day.long_break_progress(&self.settings),
            progress_label: self.day.progress_label(&self.settings),
        }
    }

    /// Flatten the state into a snapshot stamped with `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> PersistedSnapshot {
        PersistedSnapshot {
            time_remaining: self.timer.remaining_seconds,
            total_time: self.timer.total_seconds,
            is_running: self.timer.running,
            current_mode: self.timer.mode,
            day_active: self.day.active,
            day_start_time: self.day.started_at,
            completed_focus_sessions: self.day.completed_focus_sessions,
            completed_short_breaks: self.day.completed_short_breaks,
            completed_long_breaks: self.day.completed_long_breaks,
            sessions_since_last_long_break: self.day.sessions_since_last_long_break,
            sessions_before_long_break: self.settings.sessions_before_long_break(),
            auto_progress: self.settings.auto_progress(),
            last_update: now,
        }
    }

    /// Summary of the current counters as of `ended_at`
    pub fn summary(&self, ended_at: DateTime<Utc>) -> DaySummary {
        self.day.summary(ended_at, &self.durations)
    }

    // ── Timer commands ───────────────────────────────────────────────

    /// Start the countdown. Starting while already running is a no-op.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if !self.day.active {
            debug!("Start rejected, no active day");
            return Err(EngineError::DayNotActive);
        }
        self.pending_auto_start = None;
        if self.timer.running {
            return Ok(());
        }

        self.timer.running = true;
        let token = CountdownToken(self.issue_token());
        self.countdown = Some(token);
        info!(
            "Countdown started: mode={}, remaining={}s",
            self.timer.mode, self.timer.remaining_seconds
        );
        Ok(())
    }

    /// Stop the countdown and cancel any pending automatic start
    pub fn pause(&mut self) {
        if self.pending_auto_start.take().is_some() {
            debug!("Pending auto-start cancelled");
        }
        if self.timer.running {
            self.timer.running = false;
            self.countdown = None;
            info!("Countdown paused at {}s", self.timer.remaining_seconds);
        }
    }

    /// Pause, then refill the current interval
    pub fn reset(&mut self) {
        self.pause();
        self.timer.remaining_seconds = self.timer.total_seconds;
        debug!("Countdown reset to {}s", self.timer.remaining_seconds);
    }

    /// Advance the countdown by one second on behalf of `token`
    pub fn tick(&mut self, token: CountdownToken) -> TickOutcome {
        if !self.timer.running || self.countdown != Some(token) {
            return TickOutcome::Stale;
        }
        if self.timer.remaining_seconds > 0 {
            self.timer.remaining_seconds -= 1;
            TickOutcome::Counted {
                remaining_seconds: self.timer.remaining_seconds,
            }
        } else {
            TickOutcome::Completed(self.complete())
        }
    }

    /// Enter `mode` with a full interval. Does not start the countdown.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.timer.switch_mode(mode, &self.durations);
        if mode == Mode::Ready {
            self.pause();
        }
    }

    /// Finish the current interval: credit it to the day, move to the next
    /// mode and, with auto-progress on, schedule an automatic start.
    pub fn complete(&mut self) -> Completion {
        self.pause();
        let finished = self.timer.mode;
        let next = self.day.record_completion(finished, &self.settings);
        if finished != Mode::Ready {
            self.switch_mode(next);
        }

        let auto_start = if self.settings.auto_progress() && self.day.active {
            let ticket = AutoStartTicket(self.issue_token());
            self.pending_auto_start = Some(ticket);
            Some(ticket)
        } else {
            None
        };

        info!(
            "Interval complete: {} -> {} (focus={}, short={}, long={})",
            finished,
            next,
            self.day.completed_focus_sessions,
            self.day.completed_short_breaks,
            self.day.completed_long_breaks
        );
        Completion {
            finished,
            next,
            auto_start,
        }
    }

    /// Run the automatic start scheduled as `ticket`. Returns `Ok(false)` if
    /// the ticket was cancelled or superseded in the meantime.
    pub fn fire_auto_start(&mut self, ticket: AutoStartTicket) -> Result<bool, EngineError> {
        if self.pending_auto_start != Some(ticket) {
            debug!("Ignoring stale auto-start");
            return Ok(false);
        }
        self.pending_auto_start = None;
        self.start()?;
        Ok(true)
    }

    /// Validate and apply a configuration change
    pub fn set_settings(&mut self, update: SettingsUpdate) -> Result<(), EngineError> {
        self.settings.apply(update)?;
        if !self.settings.auto_progress() && self.pending_auto_start.take().is_some() {
            debug!("Auto-progress disabled, pending auto-start dropped");
        }
        info!(
            "Settings updated: sessions_before_long_break={}, auto_progress={}",
            self.settings.sessions_before_long_break(),
            self.settings.auto_progress()
        );
        Ok(())
    }

    // ── Day lifecycle ────────────────────────────────────────────────

    /// Begin a day at `now`: zero the counters and enter Focus
    pub fn start_day(&mut self, now: DateTime<Utc>) {
        if self.day.active {
            info!("Day restarted while active, counters cleared");
        }
        self.pending_auto_start = None;
        self.day.begin(now);
        self.switch_mode(Mode::Focus);
        info!("Day started at {}", now);
    }

    /// Stop the countdown, close the day and report on it. Counters stay
    /// visible until [`TimerEngine::start_new_day`].
    pub fn end_day(&mut self, now: DateTime<Utc>) -> DaySummary {
        self.pause();
        self.day.close();
        let summary = self.summary(now);
        info!(
            "Day ended: {} focus sessions, {} minutes",
            summary.focus_sessions, summary.total_focus_minutes
        );
        summary
    }

    /// Wipe the day and return to Ready
    pub fn start_new_day(&mut self) {
        self.day.clear();
        self.switch_mode(Mode::Ready);
        info!("Ready for a new day");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn short_durations() -> Durations {
        Durations {
            focus_seconds: 3,
            short_break_seconds: 2,
            long_break_seconds: 4,
        }
    }

    fn engine() -> TimerEngine {
        TimerEngine::new(short_durations())
    }

    /// Tick the live countdown until it completes
    fn run_to_completion(engine: &mut TimerEngine) -> Completion {
        if !engine.is_running() {
            engine.start().unwrap();
        }
        let token = engine.countdown_token().unwrap();
        loop {
            match engine.tick(token) {
                TickOutcome::Completed(c) => return c,
                TickOutcome::Counted { .. } => {
                    let timer = engine.timer();
                    assert!(timer.remaining_seconds <= timer.total_seconds);
                }
                TickOutcome::Stale => panic!("countdown went stale"),
            }
        }
    }

    #[test]
    fn starts_ready_and_idle() {
        let engine = engine();
        assert_eq!(engine.timer().mode, Mode::Ready);
        assert!(!engine.is_running());
        assert!(!engine.day().active);
    }

    #[test]
    fn start_without_day_is_rejected() {
        let mut engine = engine();
        assert_eq!(engine.start(), Err(EngineError::DayNotActive));
        assert!(!engine.is_running());
        assert!(engine.countdown_token().is_none());
    }

    #[test]
    fn start_twice_keeps_one_countdown() {
        let mut engine = engine();
        engine.start_day(now());
        engine.start().unwrap();
        let token = engine.countdown_token();
        engine.start().unwrap();
        assert_eq!(engine.countdown_token(), token);
    }

    #[test]
    fn tick_counts_down_then_completes_on_zero() {
        let mut engine = engine();
        engine.start_day(now());
        engine.start().unwrap();
        let token = engine.countdown_token().unwrap();

        assert_eq!(engine.tick(token), TickOutcome::Counted { remaining_seconds: 2 });
        assert_eq!(engine.tick(token), TickOutcome::Counted { remaining_seconds: 1 });
        assert_eq!(engine.tick(token), TickOutcome::Counted { remaining_seconds: 0 });
        match engine.tick(token) {
            TickOutcome::Completed(c) => {
                assert_eq!(c.finished, Mode::Focus);
                assert_eq!(c.next, Mode::ShortBreak);
                assert!(c.auto_start.is_none());
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert!(!engine.is_running());
        assert_eq!(engine.timer().remaining_seconds, 2);
    }

    #[test]
    fn stale_token_is_ignored_after_pause_and_restart() {
        let mut engine = engine();
        engine.start_day(now());
        engine.start().unwrap();
        let old = engine.countdown_token().unwrap();
        engine.pause();
        assert_eq!(engine.tick(old), TickOutcome::Stale);

        engine.start().unwrap();
        assert_eq!(engine.tick(old), TickOutcome::Stale);
        assert_eq!(engine.timer().remaining_seconds, 3);
    }

    #[test]
    fn reset_refills_and_pauses() {
        let mut engine = engine();
        engine.start_day(now());
        engine.start().unwrap();
        let token = engine.countdown_token().unwrap();
        engine.tick(token);
        engine.reset();

        assert!(!engine.is_running());
        assert_eq!(engine.timer().remaining_seconds, engine.timer().total_seconds);
    }

    #[test]
    fn cadence_cycles_every_four_focus_sessions() {
        let mut engine = engine();
        engine.start_day(now());

        let mut modes = vec![engine.timer().mode];
        for _ in 0..16 {
            run_to_completion(&mut engine);
            modes.push(engine.timer().mode);
        }

        use Mode::*;
        let cycle = [Focus, ShortBreak, Focus, ShortBreak, Focus, ShortBreak, Focus, LongBreak];
        let expected: Vec<Mode> = cycle.iter().cycle().take(17).copied().collect();
        assert_eq!(modes, expected);
    }

    #[test]
    fn counters_track_each_completion() {
        let mut engine = engine();
        engine.start_day(now());

        // Focus, Short, Focus, Short, Focus
        for _ in 0..5 {
            run_to_completion(&mut engine);
        }
        let day = engine.day();
        assert_eq!(day.completed_focus_sessions, 3);
        assert_eq!(day.completed_short_breaks, 2);
        assert_eq!(day.completed_long_breaks, 0);
        assert_eq!(day.sessions_since_last_long_break, 3);

        // Short, Focus (4th) -> LongBreak, LongBreak
        for _ in 0..3 {
            run_to_completion(&mut engine);
        }
        let day = engine.day();
        assert_eq!(day.completed_focus_sessions, 4);
        assert_eq!(day.completed_short_breaks, 3);
        assert_eq!(day.completed_long_breaks, 1);
        assert_eq!(day.sessions_since_last_long_break, 0);
    }

    #[test]
    fn settings_change_applies_to_the_next_focus_completion() {
        let mut engine = engine();
        engine.start_day(now());
        assert!(engine
            .set_settings(SettingsUpdate {
                sessions_before_long_break: 0,
                auto_progress: false,
            })
            .is_err());
        assert!(engine
            .set_settings(SettingsUpdate {
                sessions_before_long_break: 11,
                auto_progress: false,
            })
            .is_err());
        assert_eq!(engine.settings().sessions_before_long_break(), 4);

        engine
            .set_settings(SettingsUpdate {
                sessions_before_long_break: 1,
                auto_progress: false,
            })
            .unwrap();
        assert_eq!(run_to_completion(&mut engine).next, Mode::LongBreak);
    }

    #[test]
    fn auto_progress_schedules_a_ticket() {
        let mut engine = engine();
        engine.start_day(now());
        engine
            .set_settings(SettingsUpdate {
                sessions_before_long_break: 4,
                auto_progress: true,
            })
            .unwrap();

        let completion = run_to_completion(&mut engine);
        let ticket = completion.auto_start.unwrap();
        assert_eq!(engine.pending_auto_start(), Some(ticket));
        assert!(!engine.is_running());

        assert_eq!(engine.fire_auto_start(ticket), Ok(true));
        assert!(engine.is_running());
        assert_eq!(engine.timer().mode, Mode::ShortBreak);
    }

    #[test]
    fn pause_or_reset_cancels_pending_auto_start() {
        for cancel in [TimerEngine::pause as fn(&mut TimerEngine), TimerEngine::reset] {
            let mut engine = engine();
            engine.start_day(now());
            engine
                .set_settings(SettingsUpdate {
                    sessions_before_long_break: 4,
                    auto_progress: true,
                })
                .unwrap();
            let ticket = run_to_completion(&mut engine).auto_start.unwrap();

            cancel(&mut engine);
            assert_eq!(engine.fire_auto_start(ticket), Ok(false));
            assert!(!engine.is_running());
        }
    }

    #[test]
    fn end_day_keeps_counters_until_new_day() {
        let mut engine = engine();
        engine.start_day(now());
        run_to_completion(&mut engine);
        engine.start().unwrap();

        let summary = engine.end_day(now());
        assert_eq!(summary.focus_sessions, 1);
        assert!(!engine.is_running());
        assert!(!engine.day().active);
        assert_eq!(engine.day().completed_focus_sessions, 1);
        assert_eq!(engine.start(), Err(EngineError::DayNotActive));

        engine.start_new_day();
        assert_eq!(engine.day(), &DayRecord::default());
        assert_eq!(engine.timer().mode, Mode::Ready);
        assert!(!engine.is_running());
    }

    #[test]
    fn start_day_while_active_restarts_counters() {
        let mut engine = engine();
        engine.start_day(now());
        run_to_completion(&mut engine);
        engine.start_day(now());

        assert_eq!(engine.day().completed_focus_sessions, 0);
        assert_eq!(engine.timer().mode, Mode::Focus);
    }

    #[test]
    fn display_projects_the_state() {
        let mut engine = TimerEngine::new(Durations::from_minutes(25, 5, 30));
        let idle = engine.display();
        assert_eq!(idle.clock, "25:00");
        assert_eq!(idle.mode_label, "Ready to Start");
        assert_eq!(idle.progress_fraction, 0.0);
        assert!(!idle.day_active);

        engine.start_day(now());
        let display = engine.display();
        assert_eq!(display.mode, Mode::Focus);
        assert_eq!(display.mode_label, "Focus Time");
        assert_eq!(display.progress_label, "0 of 4 sessions until long break");
    }
}
