//! Persisted snapshot record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{settings::validate_sessions, Mode};
use crate::error::StoreError;

/// Flat record of timer, day and configuration state plus the instant it
/// was written. This is the only durable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub time_remaining: u64,
    pub total_time: u64,
    pub is_running: bool,
    pub current_mode: Mode,
    pub day_active: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub day_start_time: Option<DateTime<Utc>>,
    pub completed_focus_sessions: u32,
    pub completed_short_breaks: u32,
    pub completed_long_breaks: u32,
    pub sessions_since_last_long_break: u32,
    pub sessions_before_long_break: u32,
    pub auto_progress: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_update: DateTime<Utc>,
}

impl PersistedSnapshot {
    /// Check the constraints a snapshot must satisfy before it is written
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_sessions(self.sessions_before_long_break)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        if self.total_time == 0 {
            return Err(StoreError::Invalid("totalTime must be positive".to_string()));
        }
        if self.time_remaining > self.total_time {
            return Err(StoreError::Invalid(format!(
                "timeRemaining {} exceeds totalTime {}",
                self.time_remaining, self.total_time
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }
}
