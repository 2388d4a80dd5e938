//! Focus Day - A crash-tolerant focus/break day timer
//!
//! This is the main entry point for the focus-day server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use focus_day::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    state::AppState,
    store::FileSnapshotStore,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_day={},tower_http=info", config.log_level()))
        .init();

    let durations = config.durations();
    let state_path = config.state_path();
    info!("Starting focus-day server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, focus={}s, short={}s, long={}s, catch_up={:?}",
        config.host,
        config.port,
        durations.focus_seconds,
        durations.short_break_seconds,
        durations.long_break_seconds,
        config.catch_up
    );
    info!("Snapshot file: {}", state_path.display());

    // Restore state from the last snapshot
    let (state, outcome) = AppState::restore(
        durations,
        config.catch_up,
        Arc::new(SystemClock),
        Arc::new(FileSnapshotStore::new(state_path)),
        config.port,
        config.host.clone(),
    );
    info!("Resumed from snapshot: {:?}", outcome);

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /day/start     - Start the day");
    info!("  POST /day/end       - End the day and get a summary");
    info!("  POST /day/new       - Clear the day and return to ready");
    info!("  POST /timer/start   - Start the countdown");
    info!("  POST /timer/pause   - Pause the countdown");
    info!("  POST /timer/reset   - Reset the current interval");
    info!("  POST /timer/resync  - Resync after regaining focus");
    info!("  PUT  /settings      - Update cadence and auto-progress");
    info!("  GET  /summary       - Summary so far");
    info!("  GET  /status        - Display state and server info");
    info!("  GET  /health        - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.persist() {
        tracing::error!("Failed to save final snapshot: {}", e);
    }
    info!("Server shutdown complete");
    Ok(())
}
