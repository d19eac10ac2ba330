//! Linking permissions to roles.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::SharedState;
use crate::error::{AppError, Result};

/// Create role-permission routes
pub fn router() -> Router<SharedState> {
    Router::new().route("/role-permission", post(create))
}

#[derive(Debug, Deserialize)]
pub struct CreateRolePermissionRequest {
    #[serde(default)]
    pub role_key: String,
    #[serde(default)]
    pub permission_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Attach a permission to a role at the default resource scope.
pub async fn create(
    State(state): State<SharedState>,
    payload: Option<Json<CreateRolePermissionRequest>>,
) -> Result<Json<StatusResponse>> {
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };
    let role_key = payload.role_key.trim();
    let permission_id = payload.permission_id.trim();
    if role_key.is_empty() || permission_id.is_empty() {
        return Err(AppError::Validation(
            "role_key and permission_id are required".into(),
        ));
    }

    state
        .store
        .link_role_permission(role_key, permission_id)
        .await
        .map_err(|err| match err {
            AppError::NotFound(_) => AppError::NotFound("role or permission not found".into()),
            other => other,
        })?;

    Ok(Json(StatusResponse { status: "ok" }))
}
