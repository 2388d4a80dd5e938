//! Read-only projection handed to the presentation layer

use serde::{Deserialize, Serialize};

use super::Mode;

/// Everything a UI needs to render the timer after a mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    pub minutes: u64,
    pub seconds: u64,
    /// `MM:SS`
    pub clock: String,
    pub mode: Mode,
    pub mode_label: String,
    pub running: bool,
    /// Fraction of the current interval already elapsed
    pub interval_progress: f64,
    pub day_active: bool,
    pub completed_focus_sessions: u32,
    pub completed_long_breaks: u32,
    /// 0..1 toward the next long break
    pub progress_fraction: f64,
    pub progress_label: String,
}
