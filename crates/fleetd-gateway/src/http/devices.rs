//! Admin CRUD for devices, including the regime table the scheduler
//! evaluates. Same shape as the users surface.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use fleetd_registry::{Device, DeviceFilter, DevicePatch, NewDevice};
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{registry_error, ApiError};

/// GET /devices — equality-filtered listing.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DeviceFilter>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let devices = state.directory.query(&filter).map_err(registry_error)?;
    Ok(Json(devices))
}

/// POST /devices — create, 201 with the new record. The owner must
/// exist and regime keys must be valid "HH:MM" minute keys.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewDevice>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let device = state.directory.create(&new).map_err(registry_error)?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// PATCH /devices — body carries the id plus any fields to change.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<DevicePatch>,
) -> Result<Json<Device>, ApiError> {
    let device = state.directory.patch(&patch).map_err(registry_error)?;
    Ok(Json(device))
}

/// DELETE /devices/{id} — cascades to the device's commands.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete(id).map_err(registry_error)?;
    Ok(StatusCode::NO_CONTENT)
}
