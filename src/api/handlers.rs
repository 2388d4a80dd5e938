//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, info, warn};

use super::responses::{ApiResponse, DayEndResponse, HealthResponse, StatusResponse};
use crate::{
    engine::ResyncOutcome,
    error::{AppError, EngineError},
    state::{AppState, DaySummary, DisplayState, SettingsUpdate},
};

type IntentResult = Result<(StatusCode, Json<ApiResponse>), StatusCode>;

/// Map an intent result to a response. Engine rejections become notices
/// carrying the unchanged display state.
fn intent_response(state: &AppState, result: Result<DisplayState, AppError>, message: String) -> IntentResult {
    match result {
        Ok(display) => Ok((StatusCode::OK, Json(ApiResponse::ok(message, display)))),
        Err(AppError::Engine(e)) => {
            warn!("Intent rejected: {}", e);
            let code = match e {
                EngineError::DayNotActive => StatusCode::CONFLICT,
                EngineError::InvalidSessionsBeforeLongBreak { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            };
            let display = state.display().map_err(|e| {
                error!("Failed to read display state: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            Ok((code, Json(ApiResponse::notice(e.to_string(), display))))
        }
        Err(e) => {
            error!("Intent failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /day/start
pub async fn start_day_handler(State(state): State<Arc<AppState>>) -> IntentResult {
    info!("Start-day endpoint called");
    let result = state.start_day();
    intent_response(&state, result, "Day started! Let's focus!".to_string())
}

/// Handle POST /day/end - Close the day and return its summary
pub async fn end_day_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DayEndResponse>, StatusCode> {
    match state.end_day() {
        Ok((summary, display)) => {
            info!("End-day endpoint called - {} focus sessions", summary.focus_sessions);
            Ok(Json(DayEndResponse {
                status: "ok".to_string(),
                summary,
                display,
            }))
        }
        Err(e) => {
            error!("Failed to end day: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /day/new
pub async fn new_day_handler(State(state): State<Arc<AppState>>) -> IntentResult {
    info!("New-day endpoint called");
    let result = state.start_new_day();
    intent_response(&state, result, "Ready for a new day".to_string())
}

/// Handle POST /timer/start
pub async fn start_handler(State(state): State<Arc<AppState>>) -> IntentResult {
    let result = state.start();
    intent_response(&state, result, "Timer running".to_string())
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> IntentResult {
    let result = state.pause();
    intent_response(&state, result, "Timer paused".to_string())
}

/// Handle POST /timer/reset
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> IntentResult {
    let result = state.reset();
    intent_response(&state, result, "Timer reset".to_string())
}

/// Handle POST /timer/resync - Called when the client regains the foreground
pub async fn resync_handler(State(state): State<Arc<AppState>>) -> IntentResult {
    let result = state.resync().map(|(outcome, display)| {
        let message = match outcome {
            ResyncOutcome::NotRunning => "Timer not running, nothing to resync".to_string(),
            ResyncOutcome::Skipped => "No matching snapshot, resync skipped".to_string(),
            ResyncOutcome::Corrected { remaining_seconds } => {
                format!("Countdown resynced to {}s", remaining_seconds)
            }
            ResyncOutcome::Completed(completion) => {
                format!("{} finished while away", completion.finished.label())
            }
        };
        (message, display)
    });
    match result {
        Ok((message, display)) => intent_response(&state, Ok(display), message),
        Err(e) => intent_response(&state, Err(e), String::new()),
    }
}

/// Handle PUT /settings
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> IntentResult {
    let result = state.set_settings(update);
    let message = format!(
        "Settings saved! Long break after {} sessions{}",
        update.sessions_before_long_break,
        if update.auto_progress { ", auto-progress enabled" } else { "" }
    );
    intent_response(&state, result, message)
}

/// Handle GET /summary - Summary of the counters so far
pub async fn summary_handler(State(state): State<Arc<AppState>>) -> Result<Json<DaySummary>, StatusCode> {
    state.summary().map(Json).map_err(|e| {
        error!("Failed to build summary: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Handle GET /status - Return current display state and server metadata
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let view = state.inspect(|engine| {
        (
            engine.display(),
            *engine.settings(),
            engine.timer().remaining_seconds,
            engine.timer().total_seconds,
            engine.day().started_at,
        )
    });
    let (display, settings, remaining_seconds, total_seconds, day_started_at) = match view {
        Ok(view) => view,
        Err(e) => {
            error!("Failed to read engine state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        display,
        settings,
        remaining_seconds,
        total_seconds,
        day_started_at,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
