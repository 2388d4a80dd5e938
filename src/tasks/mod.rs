//! Background tasks module
//!
//! Schedulable work owned by [`crate::state::AppState`]: the countdown
//! driver and the auto-progress grace delay. Both carry the engine token
//! they were spawned for and do nothing once it is stale.

pub mod auto_progress;
pub mod countdown;
pub mod wake_up_recovery;

// Re-export main functions
pub use auto_progress::spawn_auto_start;
pub use countdown::spawn_countdown;
pub use wake_up_recovery::WakeDetector;
