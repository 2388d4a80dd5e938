//! Host suspension detection
//!
//! Tokio's timers run on the monotonic clock, which stops while the host is
//! suspended. The wall clock keeps going, so a wall-clock step that outruns
//! the monotonic one by more than the tolerance means the process was frozen.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{clock::Clock, engine::ResyncOutcome, state::AppState};

/// Wall-clock lead over monotonic time that counts as a suspension
pub const SUSPEND_TOLERANCE_SECS: i64 = 2;

/// Compares wall-clock progress against monotonic progress between checks
pub struct WakeDetector {
    clock: Arc<dyn Clock>,
    last_wall: DateTime<Utc>,
    last_mono: Instant,
}

impl WakeDetector {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let last_wall = clock.now();
        Self {
            clock,
            last_wall,
            last_mono: Instant::now(),
        }
    }

    /// Seconds the host appears to have been suspended since the previous
    /// check, if any
    pub fn check(&mut self) -> Option<i64> {
        let wall = self.clock.now();
        let mono = Instant::now();
        let wall_delta = (wall - self.last_wall).num_seconds();
        let mono_delta = mono.duration_since(self.last_mono).as_secs() as i64;
        self.last_wall = wall;
        self.last_mono = mono;

        let gap = wall_delta - mono_delta;
        (gap > SUSPEND_TOLERANCE_SECS).then_some(gap)
    }
}

/// Resync the engine after a detected suspension
pub fn recover_from_wake(state: &Arc<AppState>, gap_secs: i64) {
    info!("System wake-up detected (~{}s suspended), resyncing countdown", gap_secs);
    match state.resync() {
        Ok((ResyncOutcome::Corrected { remaining_seconds }, _)) => {
            info!("Countdown corrected to {}s", remaining_seconds);
        }
        Ok((ResyncOutcome::Completed(completion), _)) => {
            info!("Interval {} finished while suspended", completion.finished);
        }
        Ok((outcome, _)) => {
            info!("Resync made no change: {:?}", outcome);
        }
        Err(e) => {
            warn!("Failed to resync after wake-up: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};

    #[test]
    fn wall_clock_jump_is_reported() {
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
        let mut detector = WakeDetector::new(clock.clone());
        assert_eq!(detector.check(), None);

        clock.advance(Duration::seconds(600));
        let gap = detector.check().unwrap();
        assert!(gap >= 590, "gap was {}", gap);

        assert_eq!(detector.check(), None);
    }

    #[test]
    fn wall_clock_going_backwards_is_not_a_wake() {
        let clock = Arc::new(ManualClock::new(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
        let mut detector = WakeDetector::new(clock.clone());
        clock.advance(Duration::seconds(-3600));
        assert_eq!(detector.check(), None);
    }
}
