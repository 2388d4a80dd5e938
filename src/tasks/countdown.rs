//! Countdown driver task

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

use super::wake_up_recovery::{recover_from_wake, WakeDetector};
use crate::{
    engine::{CountdownToken, TickOutcome},
    state::AppState,
};

/// Spawn the once-per-second driver for the countdown run `token`
pub fn spawn_countdown(state: Arc<AppState>, token: CountdownToken) -> JoinHandle<()> {
    tokio::spawn(countdown_task(state, token))
}

/// Tick the engine every second until the run ends. Exits on its own once
/// the engine reports the token as stale; it is also aborted by the owner.
async fn countdown_task(state: Arc<AppState>, token: CountdownToken) {
    debug!("Countdown task started for {:?}", token);

    let mut wake = WakeDetector::new(Arc::clone(state.clock()));
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        // A resync already charges this second against the countdown
        if let Some(gap) = wake.check() {
            recover_from_wake(&state, gap);
            continue;
        }

        match state.tick(token) {
            Ok(TickOutcome::Counted { remaining_seconds }) => {
                if remaining_seconds % 60 == 0 {
                    debug!("{}s remaining", remaining_seconds);
                }
            }
            Ok(TickOutcome::Completed(completion)) => {
                info!(
                    "Countdown finished: {} -> {}{}",
                    completion.finished,
                    completion.next,
                    if completion.auto_start.is_some() { " (auto-progress)" } else { "" }
                );
                break;
            }
            Ok(TickOutcome::Stale) => {
                debug!("Countdown {:?} superseded, stopping", token);
                break;
            }
            Err(e) => {
                error!("Countdown tick failed: {}", e);
                break;
            }
        }
    }
}
