//! Health check endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::SharedState;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Liveness: the process is up; no external dependencies are touched.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness: the database answers a trivial query.
pub async fn readiness_check(State(state): State<SharedState>) -> Result<Json<HealthResponse>> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await?;
    Ok(Json(HealthResponse { status: "ready" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_is_static() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "ok");
    }
}
