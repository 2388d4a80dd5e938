//! Auto-progress grace delay

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    engine::{AutoStartTicket, AUTO_PROGRESS_DELAY_SECS},
    state::AppState,
};

/// Start the next interval after the grace delay unless `ticket` is
/// cancelled first
pub fn spawn_auto_start(state: Arc<AppState>, ticket: AutoStartTicket) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(Duration::from_secs(AUTO_PROGRESS_DELAY_SECS)).await;
        match state.fire_auto_start(ticket) {
            Ok(true) => info!("Next interval started automatically"),
            Ok(false) => debug!("Auto-start {:?} was cancelled", ticket),
            Err(e) => warn!("Auto-start refused: {}", e),
        }
    })
}
