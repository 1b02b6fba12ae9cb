//! # API Endpoint Handlers
//!
//! Tick and flush do file I/O under the session lock, so they run on the
//! blocking pool. Chat and status only touch memory and lock in place.

use super::{
    AppState,
    types::{ChatRequest, ErrorResponse, FlushResponse, HealthResponse, StatusResponse},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use precog_core::{ChatOutcome, TickFrame, TickReport};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn worker_failed(e: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %e, "Session worker failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("Session worker failed: {}", e))),
    )
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Session id, output location, counters.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.lock().await;

    Json(StatusResponse {
        session_id: session.session_id().to_string(),
        output: session.sink_description(),
        tick: session.tick(),
        tracked_entities: session.sequences().len(),
        buffered_lines: session.buffered_lines().len(),
        stats: session.stats().clone(),
    })
}

// =============================================================================
// TICK HANDLER
// =============================================================================

/// Process one host tick.
pub async fn tick_handler(
    State(state): State<AppState>,
    Json(frame): Json<TickFrame>,
) -> Result<Json<TickReport>, ApiError> {
    let session = state.session.clone();
    let report = tokio::task::spawn_blocking(move || session.blocking_lock().on_tick(&frame))
        .await
        .map_err(worker_failed)?;
    Ok(Json(report))
}

// =============================================================================
// CHAT HANDLER
// =============================================================================

/// Attribute a chat line to a tracked player.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatOutcome>, ApiError> {
    let message = request.to_message().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;

    let outcome = state.session.lock().await.on_chat(&message);
    Ok(Json(outcome))
}

// =============================================================================
// FLUSH HANDLER
// =============================================================================

/// Write all buffered lines now.
pub async fn flush_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FlushResponse>), ApiError> {
    let session = state.session.clone();
    let response = tokio::task::spawn_blocking(move || {
        let mut session = session.blocking_lock();
        match session.flush() {
            Ok(lines) => (StatusCode::OK, FlushResponse::written(lines)),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                FlushResponse::failed(session.buffered_lines().len(), e.to_string()),
            ),
        }
    })
    .await
    .map_err(worker_failed)?;

    Ok((response.0, Json(response.1)))
}
