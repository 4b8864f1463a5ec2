use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use fleetd_core::config::FleetConfig;
use fleetd_dispatch::Dispatcher;
use fleetd_queue::CommandQueue;
use fleetd_registry::{DeviceDirectory, UserStore};

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
///
/// The admin CRUD routes talk to the managers directly; the device-facing
/// routes only ever go through the dispatcher.
pub struct AppState {
    pub config: FleetConfig,
    pub users: UserStore,
    pub directory: Arc<DeviceDirectory>,
    pub queue: Arc<CommandQueue>,
    pub dispatcher: Dispatcher,
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        // Device-facing dispatch surface
        .route(
            "/dispatch/{device_id}/poll",
            post(crate::http::dispatch::poll_handler),
        )
        .route(
            "/dispatch/report",
            post(crate::http::dispatch::report_handler),
        )
        .route(
            "/dispatch/{device_id}/events",
            post(crate::http::dispatch::event_handler),
        )
        // Admin CRUD
        .route(
            "/users",
            get(crate::http::users::list)
                .post(crate::http::users::create)
                .patch(crate::http::users::update),
        )
        .route("/users/{id}", delete(crate::http::users::remove))
        .route(
            "/devices",
            get(crate::http::devices::list)
                .post(crate::http::devices::create)
                .patch(crate::http::devices::update),
        )
        .route("/devices/{id}", delete(crate::http::devices::remove))
        .route(
            "/commands",
            get(crate::http::commands::list)
                .post(crate::http::commands::create)
                .patch(crate::http::commands::update),
        )
        .route("/commands/{id}", delete(crate::http::commands::remove))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
}
