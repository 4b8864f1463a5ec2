//! The device-facing dispatch surface — the three operations remote
//! devices actually call. Everything routes through the facade; no
//! handler here touches a manager directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use fleetd_dispatch::WireCommand;
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{dispatch_error, ApiError};

/// POST /dispatch/{device_id}/poll
///
/// Evaluates the device's regime for the current minute, claims every
/// Pending command and returns the batch in wire form. An empty array
/// means "nothing to do" — devices poll again on their own cadence.
pub async fn poll_handler(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
) -> Result<Json<Vec<WireCommand>>, ApiError> {
    let claimed = state.dispatcher.poll(device_id).map_err(dispatch_error)?;
    Ok(Json(claimed.iter().map(WireCommand::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CompletionReport {
    pub command_id: i64,
    /// Device-defined outcome code; stored verbatim.
    pub status: i64,
}

/// POST /dispatch/report — record a device's completion report.
pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    Json(report): Json<CompletionReport>,
) -> Result<StatusCode, ApiError> {
    state
        .dispatcher
        .report_completion(report.command_id, report.status)
        .map_err(dispatch_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /dispatch/{device_id}/events — out-of-band telemetry sink.
pub async fn event_handler(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    state
        .dispatcher
        .submit_event(device_id, &payload)
        .map_err(dispatch_error)?;
    Ok(StatusCode::NO_CONTENT)
}
