//! Focus Day - A crash-tolerant focus/break day timer
//!
//! This library provides the timer/day state machine, the snapshot
//! reconciliation that lets a running countdown survive restarts and host
//! suspension, and a small HTTP service that exposes it to a UI.

pub mod api;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{CatchUpPolicy, TimerEngine};
pub use error::{AppError, EngineError, StoreError};
pub use state::AppState;
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use utils::signals::shutdown_signal;
