//! Admin CRUD for user accounts — GET filters, POST create, PATCH
//! partial update (id in body), DELETE by path id.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use fleetd_registry::{NewUser, User, UserFilter, UserPatch};
use std::sync::Arc;

use crate::app::AppState;
use crate::http::{registry_error, ApiError};

/// GET /users — equality-filtered listing.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.query(&filter).map_err(registry_error)?;
    Ok(Json(users))
}

/// POST /users — create, 201 with the new record.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.users.create(&new).map_err(registry_error)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /users — body carries the id plus any fields to change.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let user = state.users.patch(&patch).map_err(registry_error)?;
    Ok(Json(user))
}

/// DELETE /users/{id}
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.users.delete(id).map_err(registry_error)?;
    Ok(StatusCode::NO_CONTENT)
}
