//! Admin CRUD for queued commands. Creation goes through the queue's
//! `enqueue`, so an operator-created command is indistinguishable from a
//! scheduler-created one: Pending, stamped now.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use fleetd_queue::{Command, CommandFilter, CommandPatch};
use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{queue_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct NewCommand {
    pub device_id: i64,
    pub command: String,
    #[serde(default = "empty_object")]
    pub kwargs: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// GET /commands — equality-filtered listing. `status` takes the wire
/// integer (0 pending, 1 dispatched, n ⇒ completed with code n).
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<CommandFilter>,
) -> Result<Json<Vec<Command>>, ApiError> {
    let commands = state.queue.query(&filter).map_err(queue_error)?;
    Ok(Json(commands))
}

/// POST /commands — manual enqueue, 201 with the Pending record.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCommand>,
) -> Result<(StatusCode, Json<Command>), ApiError> {
    let command = state
        .queue
        .enqueue(new.device_id, &new.command, new.kwargs)
        .map_err(queue_error)?;
    Ok((StatusCode::CREATED, Json(command)))
}

/// PATCH /commands — body carries the id plus any fields to change;
/// `device_id` is immutable and rejected.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<CommandPatch>,
) -> Result<Json<Command>, ApiError> {
    let command = state.queue.patch(&patch).map_err(queue_error)?;
    Ok(Json(command))
}

/// DELETE /commands/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.queue.remove(id).map_err(queue_error)?;
    Ok(StatusCode::NO_CONTENT)
}
