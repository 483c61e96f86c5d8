//! Session control endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tagsense_common::TagCounterSnapshot;
use tracing::info;

use super::{ApiError, ApiResponse, AppState};
use crate::session::SessionStatus;

#[derive(Debug, Serialize)]
pub struct ThresholdData {
    pub threshold: u32,
}

/// POST /api/rfid/start
pub async fn start_reading(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    state.controller.start().await?;
    let status = state.controller.status().await;
    Ok(Json(
        ApiResponse::success(status).with_message("RFID reading started successfully"),
    ))
}

/// POST /api/rfid/stop
pub async fn stop_reading(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    state.controller.stop().await?;
    let status = state.controller.status().await;
    Ok(Json(
        ApiResponse::success(status).with_message("RFID reading stopped successfully"),
    ))
}

/// GET /api/rfid/status
pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<SessionStatus>> {
    Json(ApiResponse::success(state.controller.status().await))
}

/// GET /api/rfid/counter
pub async fn get_tag_counter(
    State(state): State<AppState>,
) -> Json<ApiResponse<TagCounterSnapshot>> {
    Json(ApiResponse::success(state.controller.snapshot().await))
}

/// POST /api/rfid/threshold/:value
///
/// Values ≤ 0 are rejected with 400 and leave the threshold unchanged.
pub async fn set_threshold(
    State(state): State<AppState>,
    Path(value): Path<i64>,
) -> Result<Json<ApiResponse<ThresholdData>>, ApiError> {
    let threshold = state.controller.set_threshold(value).await?;
    Ok(Json(
        ApiResponse::success(ThresholdData { threshold })
            .with_message(format!("Threshold set to {} successfully", threshold)),
    ))
}

/// POST /api/rfid/reset
///
/// Stops the session, pauses briefly and starts a fresh one with an empty
/// store.
pub async fn reset_counter(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    info!("Counter reset requested");
    state.controller.reset().await?;
    let status = state.controller.status().await;
    Ok(Json(
        ApiResponse::success(status).with_message("Counter reset successfully"),
    ))
}
