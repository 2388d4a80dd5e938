//! Shared runtime state
//!
//! Wraps the synchronous [`TimerEngine`] together with the injected clock and
//! snapshot store, and owns the background tasks that drive it. Every intent
//! goes through [`AppState::apply`]: mutate the engine, persist a snapshot,
//! bring the scheduled tasks in line with the engine, publish the display.

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::{DaySummary, DisplayState, Durations, SettingsUpdate};
use crate::{
    clock::Clock,
    engine::{
        AutoStartTicket, CatchUpPolicy, CountdownToken, RestoreOutcome, ResyncOutcome,
        TickOutcome, TimerEngine,
    },
    error::AppError,
    store::SnapshotStore,
    tasks::{spawn_auto_start, spawn_countdown},
};

/// Handles of the tasks currently scheduled on behalf of the engine
#[derive(Default)]
struct TaskHandles {
    countdown: Option<(CountdownToken, JoinHandle<()>)>,
    auto_start: Option<(AutoStartTicket, JoinHandle<()>)>,
}

/// Main application state shared between the HTTP handlers and the tasks
pub struct AppState {
    engine: Mutex<TimerEngine>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SnapshotStore>,
    tasks: Mutex<TaskHandles>,
    /// Display projection, updated after every mutation
    pub display_tx: watch::Sender<DisplayState>,
    /// Keep the receiver alive to prevent channel closure
    _display_rx: watch::Receiver<DisplayState>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Load the stored snapshot, reconcile it against the clock and start
    /// whatever tasks the restored engine needs. Must run inside a tokio
    /// runtime.
    pub fn restore(
        durations: Durations,
        catch_up: CatchUpPolicy,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SnapshotStore>,
        port: u16,
        host: String,
    ) -> (Arc<Self>, RestoreOutcome) {
        let snapshot = match store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Stored snapshot unusable, starting fresh: {}", e);
                None
            }
        };
        let (engine, outcome) = TimerEngine::restore(durations, snapshot, clock.now(), catch_up);
        info!("Restore outcome: {:?}", outcome);

        let (display_tx, display_rx) = watch::channel(engine.display());
        let state = Arc::new(Self {
            engine: Mutex::new(engine),
            clock,
            store,
            tasks: Mutex::new(TaskHandles::default()),
            display_tx,
            _display_rx: display_rx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        });

        if let Err(e) = state.apply(None, |_, _| ()) {
            error!("Failed to settle restored state: {}", e);
        }
        (state, outcome)
    }

    /// The mutate-then-persist pipeline. The engine lock is held until the
    /// snapshot is written and the tasks are rescheduled, so snapshots are
    /// written in mutation order.
    fn apply<T, F>(self: &Arc<Self>, action: Option<&str>, op: F) -> Result<(T, DisplayState), AppError>
    where
        F: FnOnce(&mut TimerEngine, DateTime<Utc>) -> T,
    {
        let now = self.clock.now();
        let mut engine = self
            .engine
            .lock()
            .map_err(|e| AppError::Lock(e.to_string()))?;

        let output = op(&mut engine, now);
        let snapshot = engine.snapshot(now);
        let display = engine.display();

        if let Err(e) = self.store.save(&snapshot) {
            error!("Failed to persist snapshot: {}", e);
        }
        self.sync_tasks(engine.countdown_token(), engine.pending_auto_start());
        drop(engine);

        if let Err(e) = self.display_tx.send(display.clone()) {
            warn!("Failed to publish display update: {}", e);
        }
        if let Some(action) = action {
            if let Ok(mut last) = self.last_action.lock() {
                *last = Some((action.to_string(), now));
            }
        }
        Ok((output, display))
    }

    /// Abort superseded tasks and spawn the ones the engine now expects
    fn sync_tasks(self: &Arc<Self>, countdown: Option<CountdownToken>, auto_start: Option<AutoStartTicket>) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("Failed to lock task handles: {}", e);
                return;
            }
        };

        if tasks.countdown.as_ref().map(|(token, _)| *token) != countdown {
            if let Some((_, handle)) = tasks.countdown.take() {
                handle.abort();
                debug!("Countdown task stopped");
            }
            if let Some(token) = countdown {
                tasks.countdown = Some((token, spawn_countdown(Arc::clone(self), token)));
            }
        }

        if tasks.auto_start.as_ref().map(|(ticket, _)| *ticket) != auto_start {
            if let Some((_, handle)) = tasks.auto_start.take() {
                handle.abort();
            }
            if let Some(ticket) = auto_start {
                tasks.auto_start = Some((ticket, spawn_auto_start(Arc::clone(self), ticket)));
            }
        }
    }

    // ── Intents ──────────────────────────────────────────────────────

    pub fn start_day(self: &Arc<Self>) -> Result<DisplayState, AppError> {
        let ((), display) = self.apply(Some("start-day"), |engine, now| engine.start_day(now))?;
        Ok(display)
    }

    pub fn end_day(self: &Arc<Self>) -> Result<(DaySummary, DisplayState), AppError> {
        self.apply(Some("end-day"), |engine, now| engine.end_day(now))
    }

    pub fn start_new_day(self: &Arc<Self>) -> Result<DisplayState, AppError> {
        let ((), display) = self.apply(Some("new-day"), |engine, _| engine.start_new_day())?;
        Ok(display)
    }

    pub fn start(self: &Arc<Self>) -> Result<DisplayState, AppError> {
        let (result, display) = self.apply(Some("start"), |engine, _| engine.start())?;
        result?;
        Ok(display)
    }

    pub fn pause(self: &Arc<Self>) -> Result<DisplayState, AppError> {
        let ((), display) = self.apply(Some("pause"), |engine, _| engine.pause())?;
        Ok(display)
    }

    pub fn reset(self: &Arc<Self>) -> Result<DisplayState, AppError> {
        let ((), display) = self.apply(Some("reset"), |engine, _| engine.reset())?;
        Ok(display)
    }

    pub fn set_settings(self: &Arc<Self>, update: SettingsUpdate) -> Result<DisplayState, AppError> {
        let (result, display) = self.apply(Some("settings"), |engine, _| engine.set_settings(update))?;
        result?;
        Ok(display)
    }

    /// Re-derive the live countdown from the stored snapshot, e.g. after the
    /// host was suspended
    pub fn resync(self: &Arc<Self>) -> Result<(ResyncOutcome, DisplayState), AppError> {
        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok((ResyncOutcome::Skipped, self.display()?)),
            Err(e) => {
                warn!("Cannot resync, stored snapshot unusable: {}", e);
                return Ok((ResyncOutcome::Skipped, self.display()?));
            }
        };
        self.apply(Some("resync"), |engine, now| engine.resync(&snapshot, now))
    }

    // ── Task callbacks ───────────────────────────────────────────────

    pub(crate) fn tick(self: &Arc<Self>, token: CountdownToken) -> Result<TickOutcome, AppError> {
        let (outcome, _) = self.apply(None, |engine, _| engine.tick(token))?;
        Ok(outcome)
    }

    pub(crate) fn fire_auto_start(self: &Arc<Self>, ticket: AutoStartTicket) -> Result<bool, AppError> {
        let (result, _) = self.apply(Some("auto-start"), |engine, _| engine.fire_auto_start(ticket))?;
        Ok(result?)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn display(&self) -> Result<DisplayState, AppError> {
        self.engine
            .lock()
            .map(|engine| engine.display())
            .map_err(|e| AppError::Lock(e.to_string()))
    }

    /// Summary of the current counters without ending the day
    pub fn summary(&self) -> Result<DaySummary, AppError> {
        let now = self.clock.now();
        self.engine
            .lock()
            .map(|engine| engine.summary(now))
            .map_err(|e| AppError::Lock(e.to_string()))
    }

    /// Run a read-only closure against the engine
    pub fn inspect<T>(&self, f: impl FnOnce(&TimerEngine) -> T) -> Result<T, AppError> {
        self.engine
            .lock()
            .map(|engine| f(&engine))
            .map_err(|e| AppError::Lock(e.to_string()))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Write a snapshot of the current state, e.g. right before shutdown
    pub fn persist(&self) -> Result<(), AppError> {
        let now = self.clock.now();
        let engine = self
            .engine
            .lock()
            .map_err(|e| AppError::Lock(e.to_string()))?;
        if let Err(e) = self.store.save(&engine.snapshot(now)) {
            error!("Failed to persist snapshot: {}", e);
        }
        Ok(())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}
