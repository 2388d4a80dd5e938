//! Error types shared across the crate

use thiserror::Error;

/// Rejections raised by the engine. None of them mutate state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The countdown was asked to start before a day was started
    #[error("Please start your day first")]
    DayNotActive,

    /// Long-break cadence outside the accepted range
    #[error("Sessions before long break must be between 1 and 10 (got {value})")]
    InvalidSessionsBeforeLongBreak { value: u32 },
}

/// Snapshot store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot parsed but violates the schema constraints
    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

/// Errors surfaced by the runtime layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to lock engine state: {0}")]
    Lock(String),
}

impl AppError {
    /// Whether the error is a user-facing notice rather than an internal failure
    pub fn is_notice(&self) -> bool {
        matches!(self, AppError::Engine(_))
    }
}
