//! Rehydrating the engine from a stale snapshot
//!
//! The snapshot carries the instant it was written. Whatever wall-clock time
//! passed since then is charged against a running countdown as if the
//! process had never stopped.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use tracing::{debug, info, warn};

use super::{Completion, TimerEngine, AUTO_PROGRESS_DELAY_SECS};
use crate::state::{DayRecord, Durations, Mode, PersistedSnapshot, Settings, TimerState};

/// How many completions a restore replays when the gap outlasts the
/// interval that was running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CatchUpPolicy {
    /// Fire exactly one completion, then wait (or auto-progress) as usual
    #[default]
    Single,
    /// Keep completing intervals that auto-progress would have started and
    /// finished during the gap, then resume the partial one
    Cascade,
}

/// What [`TimerEngine::restore`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No usable snapshot, fresh Ready engine
    ColdStart,
    /// Restored without a running countdown
    Idle,
    /// Countdown resumed with the elapsed time deducted
    Resumed { remaining_seconds: u64 },
    /// The countdown ran out while unobserved
    Completed { completions: u32, running: bool },
}

/// What [`TimerEngine::resync`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncOutcome {
    NotRunning,
    /// The snapshot describes a different interval than the live one
    Skipped,
    Corrected { remaining_seconds: u64 },
    Completed(Completion),
}

/// Whole seconds from `since` to `now`; never negative
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let seconds = (now - since).num_seconds();
    if seconds < 0 {
        warn!("Snapshot is {}s in the future, treating as no elapsed time", -seconds);
        return 0;
    }
    seconds as u64
}

impl TimerEngine {
    /// Build a live engine from `snapshot` as of `now`
    pub fn restore(
        durations: Durations,
        snapshot: Option<PersistedSnapshot>,
        now: DateTime<Utc>,
        policy: CatchUpPolicy,
    ) -> (Self, RestoreOutcome) {
        let Some(snapshot) = snapshot else {
            info!("No prior state, starting fresh");
            return (Self::new(durations), RestoreOutcome::ColdStart);
        };
        if snapshot.total_time == 0 {
            warn!("Snapshot has a zero-length interval, starting fresh");
            return (Self::new(durations), RestoreOutcome::ColdStart);
        }

        let settings = Settings::from_persisted(
            snapshot.sessions_before_long_break,
            snapshot.auto_progress,
        );
        let mut engine = Self::with_settings(durations, settings);
        engine.timer = TimerState {
            mode: snapshot.current_mode,
            remaining_seconds: snapshot.time_remaining.min(snapshot.total_time),
            total_seconds: snapshot.total_time,
            running: false,
        };
        engine.day = DayRecord {
            active: snapshot.day_active,
            started_at: snapshot.day_start_time,
            completed_focus_sessions: snapshot.completed_focus_sessions,
            completed_short_breaks: snapshot.completed_short_breaks,
            completed_long_breaks: snapshot.completed_long_breaks,
            sessions_since_last_long_break: snapshot.sessions_since_last_long_break,
        };

        if !snapshot.is_running {
            debug!("Restored paused {} with {}s left", engine.timer.mode, engine.timer.remaining_seconds);
            return (engine, RestoreOutcome::Idle);
        }
        if snapshot.current_mode == Mode::Ready {
            warn!("Snapshot marks Ready as running, restoring it paused");
            return (engine, RestoreOutcome::Idle);
        }

        let elapsed = elapsed_seconds(snapshot.last_update, now);
        let stored = engine.timer.remaining_seconds;
        let remaining = stored.saturating_sub(elapsed);
        info!(
            "Reconciling running {}: {}s stored, {}s elapsed",
            engine.timer.mode, stored, elapsed
        );

        if remaining > 0 {
            engine.timer.remaining_seconds = remaining;
            return match engine.start() {
                Ok(()) => (engine, RestoreOutcome::Resumed { remaining_seconds: remaining }),
                Err(e) => {
                    warn!("Countdown not resumed: {}", e);
                    (engine, RestoreOutcome::Idle)
                }
            };
        }

        engine.timer.remaining_seconds = 0;
        let completions = engine.catch_up(elapsed - stored, policy);
        let running = engine.is_running();
        (engine, RestoreOutcome::Completed { completions, running })
    }

    /// Correct drift of a countdown that kept running in memory while the
    /// host was suspended, using the last written snapshot
    pub fn resync(&mut self, snapshot: &PersistedSnapshot, now: DateTime<Utc>) -> ResyncOutcome {
        if !self.timer.running {
            return ResyncOutcome::NotRunning;
        }
        if snapshot.current_mode != self.timer.mode || snapshot.total_time != self.timer.total_seconds {
            debug!("Snapshot belongs to another interval, skipping resync");
            return ResyncOutcome::Skipped;
        }

        let elapsed = elapsed_seconds(snapshot.last_update, now);
        let remaining = snapshot
            .time_remaining
            .saturating_sub(elapsed)
            .min(self.timer.total_seconds);
        debug!(
            "Resync: {}s in memory, {}s from snapshot",
            self.timer.remaining_seconds, remaining
        );
        self.timer.remaining_seconds = remaining;

        if remaining == 0 {
            ResyncOutcome::Completed(self.complete())
        } else {
            ResyncOutcome::Corrected { remaining_seconds: remaining }
        }
    }

    /// Complete the exhausted interval and, under [`CatchUpPolicy::Cascade`],
    /// every auto-progressed interval that `leftover` seconds would also have
    /// covered. Returns the number of completions.
    fn catch_up(&mut self, mut leftover: u64, policy: CatchUpPolicy) -> u32 {
        let mut completions = 1;
        let mut completion = self.complete();
        if policy == CatchUpPolicy::Single {
            return completions;
        }

        while let Some(ticket) = completion.auto_start {
            if leftover < AUTO_PROGRESS_DELAY_SECS {
                break;
            }
            leftover -= AUTO_PROGRESS_DELAY_SECS;
            if !matches!(self.fire_auto_start(ticket), Ok(true)) {
                break;
            }

            let total = self.timer.remaining_seconds;
            if leftover < total {
                self.timer.remaining_seconds = total - leftover;
                break;
            }
            leftover -= total;
            self.timer.remaining_seconds = 0;
            completion = self.complete();
            completions += 1;
        }

        if completions > 1 {
            info!("Caught up {} completions", completions);
        }
        completions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn durations() -> Durations {
        Durations {
            focus_seconds: 100,
            short_break_seconds: 20,
            long_break_seconds: 50,
        }
    }

    fn running_focus(remaining: u64) -> PersistedSnapshot {
        PersistedSnapshot {
            time_remaining: remaining,
            total_time: 100,
            is_running: true,
            current_mode: Mode::Focus,
            day_active: true,
            day_start_time: Some(t0() - Duration::hours(1)),
            completed_focus_sessions: 1,
            completed_short_breaks: 1,
            completed_long_breaks: 0,
            sessions_since_last_long_break: 1,
            sessions_before_long_break: 4,
            auto_progress: false,
            last_update: t0(),
        }
    }

    fn restore(snapshot: PersistedSnapshot, after: i64, policy: CatchUpPolicy) -> (TimerEngine, RestoreOutcome) {
        TimerEngine::restore(durations(), Some(snapshot), t0() + Duration::seconds(after), policy)
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        assert_eq!(elapsed_seconds(t0(), t0() + Duration::milliseconds(2999)), 2);
        assert_eq!(elapsed_seconds(t0() + Duration::seconds(30), t0()), 0);
    }

    #[test]
    fn missing_snapshot_is_a_cold_start() {
        let (engine, outcome) = TimerEngine::restore(durations(), None, t0(), CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::ColdStart);
        assert_eq!(engine.timer().mode, Mode::Ready);
        assert_eq!(engine.settings(), &Settings::default());
    }

    #[test]
    fn paused_snapshot_restores_exactly_at_any_time() {
        let mut snapshot = running_focus(37);
        snapshot.is_running = false;
        for after in [0, 30, 86_400] {
            let (engine, outcome) = restore(snapshot.clone(), after, CatchUpPolicy::Single);
            assert_eq!(outcome, RestoreOutcome::Idle);
            assert_eq!(engine.timer().remaining_seconds, 37);
            assert!(!engine.is_running());
        }
    }

    #[test]
    fn running_snapshot_deducts_elapsed_time() {
        let (engine, outcome) = restore(running_focus(100), 30, CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::Resumed { remaining_seconds: 70 });
        assert_eq!(engine.timer().remaining_seconds, 70);
        assert!(engine.is_running());
        assert!(engine.countdown_token().is_some());
    }

    #[test]
    fn exhausted_countdown_completes_exactly_once() {
        let (engine, outcome) = restore(running_focus(100), 150, CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::Completed { completions: 1, running: false });
        assert_eq!(engine.day().completed_focus_sessions, 2);
        assert_eq!(engine.timer().mode, Mode::ShortBreak);
        assert_eq!(engine.timer().remaining_seconds, 20);
    }

    #[test]
    fn clock_skew_resumes_with_stored_remaining() {
        let (engine, outcome) = restore(running_focus(80), -600, CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::Resumed { remaining_seconds: 80 });
        assert_eq!(engine.timer().remaining_seconds, 80);
    }

    #[test]
    fn running_snapshot_without_active_day_stays_paused() {
        let mut snapshot = running_focus(100);
        snapshot.day_active = false;
        let (engine, outcome) = restore(snapshot, 10, CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::Idle);
        assert!(!engine.is_running());
    }

    #[test]
    fn out_of_range_values_are_sanitised() {
        let mut snapshot = running_focus(500);
        snapshot.is_running = false;
        snapshot.sessions_before_long_break = 99;
        let (engine, _) = restore(snapshot, 0, CatchUpPolicy::Single);
        assert_eq!(engine.timer().remaining_seconds, 100);
        assert_eq!(engine.settings().sessions_before_long_break(), 4);

        let mut broken = running_focus(0);
        broken.total_time = 0;
        let (_, outcome) = restore(broken, 0, CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::ColdStart);
    }

    #[test]
    fn single_policy_with_auto_progress_leaves_a_pending_start() {
        let mut snapshot = running_focus(10);
        snapshot.auto_progress = true;
        let (engine, outcome) = restore(snapshot, 3_600, CatchUpPolicy::Single);
        assert_eq!(outcome, RestoreOutcome::Completed { completions: 1, running: false });
        assert!(engine.pending_auto_start().is_some());
    }

    #[test]
    fn cascade_replays_auto_progressed_intervals() {
        let mut snapshot = running_focus(10);
        snapshot.auto_progress = true;
        // 10s focus left, +1 grace +20 short, +1 grace +100 focus, +1 grace, 7s into the short break
        let (engine, outcome) = restore(snapshot, 10 + 21 + 101 + 1 + 7, CatchUpPolicy::Cascade);

        assert_eq!(outcome, RestoreOutcome::Completed { completions: 3, running: true });
        let day = engine.day();
        assert_eq!(day.completed_focus_sessions, 3);
        assert_eq!(day.completed_short_breaks, 2);
        assert_eq!(engine.timer().mode, Mode::ShortBreak);
        assert_eq!(engine.timer().remaining_seconds, 13);
        assert!(engine.pending_auto_start().is_none());
    }

    #[test]
    fn cascade_without_auto_progress_stops_after_one() {
        let (engine, outcome) = restore(running_focus(10), 3_600, CatchUpPolicy::Cascade);
        assert_eq!(outcome, RestoreOutcome::Completed { completions: 1, running: false });
        assert_eq!(engine.timer().mode, Mode::ShortBreak);
    }

    #[test]
    fn resync_corrects_drift_and_completes() {
        let (mut engine, _) = restore(running_focus(100), 0, CatchUpPolicy::Single);
        let snapshot = engine.snapshot(t0());

        assert_eq!(
            engine.resync(&snapshot, t0() + Duration::seconds(40)),
            ResyncOutcome::Corrected { remaining_seconds: 60 }
        );
        assert_eq!(engine.timer().remaining_seconds, 60);

        match engine.resync(&snapshot, t0() + Duration::seconds(400)) {
            ResyncOutcome::Completed(c) => assert_eq!(c.next, Mode::ShortBreak),
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(engine.resync(&snapshot, t0()), ResyncOutcome::NotRunning);
    }
}
