//! State management module
//!
//! Plain data for the timer, the tracked day, configuration, the persisted
//! snapshot and the display projection, plus the shared runtime state.

pub mod app_state;
pub mod day_record;
pub mod display;
pub mod settings;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use day_record::{DayRecord, DaySummary, SummaryTier};
pub use display::DisplayState;
pub use settings::{Settings, SettingsUpdate};
pub use snapshot::PersistedSnapshot;
pub use timer_state::{Durations, Mode, TimerState};
