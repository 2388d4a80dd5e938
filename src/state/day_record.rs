//! Day-level counters, long-break cadence and the end-of-day summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Durations, Mode, Settings};

/// Counters for one tracked day
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayRecord {
    pub active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_focus_sessions: u32,
    pub completed_short_breaks: u32,
    pub completed_long_breaks: u32,
    pub sessions_since_last_long_break: u32,
}

impl DayRecord {
    /// Activate a fresh day starting at `now`
    pub fn begin(&mut self, now: DateTime<Utc>) {
        *self = Self {
            active: true,
            started_at: Some(now),
            ..Self::default()
        };
    }

    /// Deactivate without touching the counters
    pub fn close(&mut self) {
        self.active = false;
    }

    /// Zero everything, including the start time
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Credit the interval that just finished in `finished` and return the
    /// mode to switch to next
    pub fn record_completion(&mut self, finished: Mode, settings: &Settings) -> Mode {
        match finished {
            Mode::Focus => {
                self.completed_focus_sessions += 1;
                self.sessions_since_last_long_break += 1;
                if self.sessions_since_last_long_break >= settings.sessions_before_long_break() {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak => {
                self.completed_short_breaks += 1;
                Mode::Focus
            }
            Mode::LongBreak => {
                self.completed_long_breaks += 1;
                self.sessions_since_last_long_break = 0;
                Mode::Focus
            }
            Mode::Ready => Mode::Ready,
        }
    }

    /// Progress toward the next long break, neutral while no day is active
    pub fn long_break_progress(&self, settings: &Settings) -> f64 {
        if !self.active {
            return 0.0;
        }
        let target = settings.sessions_before_long_break().max(1);
        (self.sessions_since_last_long_break as f64 / target as f64).clamp(0.0, 1.0)
    }

    pub fn progress_label(&self, settings: &Settings) -> String {
        if !self.active {
            return "Start your day to begin tracking".to_string();
        }
        format!(
            "{} of {} sessions until long break",
            self.sessions_since_last_long_break,
            settings.sessions_before_long_break()
        )
    }

    /// Summarise the counters as of `ended_at`
    pub fn summary(&self, ended_at: DateTime<Utc>, durations: &Durations) -> DaySummary {
        let total_focus_minutes = self.completed_focus_sessions as u64 * durations.focus_minutes();
        let tier = SummaryTier::for_sessions(self.completed_focus_sessions);
        DaySummary {
            focus_sessions: self.completed_focus_sessions,
            short_breaks: self.completed_short_breaks,
            long_breaks: self.completed_long_breaks,
            total_focus_minutes,
            focus_time: format!("{}h {}m", total_focus_minutes / 60, total_focus_minutes % 60),
            started_at: self.started_at,
            ended_at,
            tier,
            message: tier.message().to_string(),
        }
    }
}

/// Motivation tier chosen from the number of focus sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryTier {
    /// No focus session completed
    GettingStarted,
    /// 1 to 3 sessions
    GoodStart,
    /// 4 to 7 sessions
    GreatWork,
    /// 8 or more
    Outstanding,
}

impl SummaryTier {
    pub fn for_sessions(focus_sessions: u32) -> Self {
        match focus_sessions {
            0 => SummaryTier::GettingStarted,
            1..=3 => SummaryTier::GoodStart,
            4..=7 => SummaryTier::GreatWork,
            _ => SummaryTier::Outstanding,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SummaryTier::GettingStarted => {
                "Every journey starts with a single step. Tomorrow is a new day!"
            }
            SummaryTier::GoodStart => "Good start! Keep building that momentum!",
            SummaryTier::GreatWork => "Great work today! You're making real progress!",
            SummaryTier::Outstanding => "Outstanding performance! You're crushing it!",
        }
    }
}

/// End-of-day report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub focus_sessions: u32,
    pub short_breaks: u32,
    pub long_breaks: u32,
    pub total_focus_minutes: u64,
    /// `total_focus_minutes` rendered as hours and minutes
    pub focus_time: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub tier: SummaryTier,
    pub message: String,
}
