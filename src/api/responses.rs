//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{DaySummary, DisplayState, Settings};

/// Response for every intent endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// `ok` or `notice`
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub display: DisplayState,
}

impl ApiResponse {
    pub fn new(status: &str, message: impl Into<String>, display: DisplayState) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            display,
        }
    }

    pub fn ok(message: impl Into<String>, display: DisplayState) -> Self {
        Self::new("ok", message, display)
    }

    /// A rejected intent; state was left unchanged
    pub fn notice(message: impl Into<String>, display: DisplayState) -> Self {
        Self::new("notice", message, display)
    }
}

/// Response for ending a day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEndResponse {
    pub status: String,
    pub summary: DaySummary,
    pub display: DisplayState,
}

/// Full status with configuration and server metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub display: DisplayState,
    pub settings: Settings,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    pub day_started_at: Option<DateTime<Utc>>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
