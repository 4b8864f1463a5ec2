//! HTTP handlers, one module per resource, plus the shared error → status
//! mapping: NotFound → 404, InvalidInput → 400, Conflict → 409, store
//! failure → 503.

pub mod commands;
pub mod devices;
pub mod dispatch;
pub mod health;
pub mod users;

use axum::{http::StatusCode, Json};
use fleetd_dispatch::DispatchError;
use fleetd_queue::QueueError;
use fleetd_registry::RegistryError;
use fleetd_scheduler::SchedulerError;
use serde_json::{json, Value};
use tracing::warn;

pub(crate) type ApiError = (StatusCode, Json<Value>);

fn reply(status: StatusCode, msg: String) -> ApiError {
    (status, Json(json!({ "error": msg })))
}

pub(crate) fn registry_error(e: RegistryError) -> ApiError {
    let status = match e {
        RegistryError::UserNotFound { .. } | RegistryError::DeviceNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        RegistryError::Conflict(_) => StatusCode::CONFLICT,
        RegistryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RegistryError::Database(_) => {
            warn!(error = %e, "registry store failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    reply(status, e.to_string())
}

pub(crate) fn queue_error(e: QueueError) -> ApiError {
    let status = match e {
        QueueError::DeviceNotFound { .. } | QueueError::CommandNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        QueueError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        QueueError::Database(_) => {
            warn!(error = %e, "queue store failure");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    reply(status, e.to_string())
}

pub(crate) fn dispatch_error(e: DispatchError) -> ApiError {
    match e {
        DispatchError::Scheduler(SchedulerError::DeviceNotFound { id }) => reply(
            StatusCode::NOT_FOUND,
            format!("Device not found: {id}"),
        ),
        DispatchError::Scheduler(SchedulerError::Registry(inner)) => registry_error(inner),
        DispatchError::Scheduler(SchedulerError::Queue(inner)) => queue_error(inner),
        DispatchError::Queue(inner) => queue_error(inner),
        DispatchError::Registry(inner) => registry_error(inner),
    }
}
