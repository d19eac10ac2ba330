//! Route definitions for the API.

use axum::{routing::get, Router};

use super::handlers;
use super::SharedState;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Admin surface
        .nest("/admin/v1", admin_v1_routes())
        // Client surface consumed by other services
        .nest("/api/v1", handlers::principals::router())
        .with_state(state)
}

/// Admin surface composed from the per-entity routers.
fn admin_v1_routes() -> Router<SharedState> {
    Router::new()
        .merge(handlers::services::router())
        .merge(handlers::roles::router())
        .merge(handlers::permissions::router())
        .merge(handlers::role_permissions::router())
}
