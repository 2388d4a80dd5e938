//! Countdown state, interval modes and the per-deployment duration table

use serde::{Deserialize, Serialize};

/// Interval mode of the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Idle before a day has been started
    Ready,
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    /// Label shown next to the countdown
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Ready => "Ready to Start",
            Mode::Focus => "Focus Time",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ready => "ready",
            Mode::Focus => "focus",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interval lengths in seconds, fixed for the lifetime of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    pub focus_seconds: u64,
    pub short_break_seconds: u64,
    pub long_break_seconds: u64,
}

impl Durations {
    /// Build a duration table from minute values. Zero-length intervals are
    /// bumped to one second so that `total_seconds > 0` always holds.
    pub fn from_minutes(focus: u64, short_break: u64, long_break: u64) -> Self {
        Self {
            focus_seconds: (focus * 60).max(1),
            short_break_seconds: (short_break * 60).max(1),
            long_break_seconds: (long_break * 60).max(1),
        }
    }

    /// Duration assigned when entering `mode`
    pub fn for_mode(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Ready | Mode::Focus => self.focus_seconds,
            Mode::ShortBreak => self.short_break_seconds,
            Mode::LongBreak => self.long_break_seconds,
        }
    }

    /// Whole minutes credited per completed focus interval
    pub fn focus_minutes(&self) -> u64 {
        self.focus_seconds / 60
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::from_minutes(25, 5, 30)
    }
}

/// Countdown state of the running instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub mode: Mode,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub running: bool,
}

impl TimerState {
    /// Create an idle timer in Ready mode
    pub fn new(durations: &Durations) -> Self {
        let total = durations.for_mode(Mode::Ready);
        Self {
            mode: Mode::Ready,
            remaining_seconds: total,
            total_seconds: total,
            running: false,
        }
    }

    /// Enter `mode` with a full interval. Leaves `running` untouched.
    pub fn switch_mode(&mut self, mode: Mode, durations: &Durations) {
        self.mode = mode;
        self.total_seconds = durations.for_mode(mode);
        self.remaining_seconds = self.total_seconds;
    }

    /// Fraction of the current interval already elapsed
    pub fn elapsed_fraction(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let done = self.total_seconds.saturating_sub(self.remaining_seconds);
        (done as f64 / self.total_seconds as f64).clamp(0.0, 1.0)
    }

    /// Remaining time split into whole minutes and seconds
    pub fn minutes_seconds(&self) -> (u64, u64) {
        (self.remaining_seconds / 60, self.remaining_seconds % 60)
    }
}
