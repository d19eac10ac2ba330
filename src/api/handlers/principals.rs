//! Client surface: principal role assignment and permission checks.
//!
//! Check endpoints express "no data" as 200 with an empty value, never 404;
//! a principal without a role is an ordinary answer, not an error.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::SharedState;
use crate::error::{AppError, Result};

/// Create principal routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/assign_role", post(assign_role))
        .route("/get_role_by_user_id", get(get_role))
        .route(
            "/get_permissions_by_user_id_for_role",
            get(get_permissions),
        )
        .route("/check_role_by_user_id", get(check_role))
        .route("/check_permission_by_user_id", get(check_permission))
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    #[serde(default)]
    pub value: AssignRoleValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignRoleValue {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleCheckQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionCheckQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub permission: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AllowedResponse {
    pub allowed: bool,
}

/// POST /assign_role
pub async fn assign_role(
    State(state): State<SharedState>,
    payload: Option<Json<AssignRoleRequest>>,
) -> Result<Json<StatusResponse>> {
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };
    let user_id = payload.value.user_id.trim();
    let role = payload.value.role.trim();
    if user_id.is_empty() || role.is_empty() {
        return Err(AppError::Validation("user_id and role are required".into()));
    }

    state
        .principals
        .assign_role(user_id, role)
        .await
        .map_err(|err| match err {
            AppError::NotFound(_) => AppError::NotFound("role not found".into()),
            other => other,
        })?;

    Ok(Json(StatusResponse { status: "ok" }))
}

/// GET /get_role_by_user_id
pub async fn get_role(
    State(state): State<SharedState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<RoleResponse>> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id is required".into()));
    }

    let role = state.principals.role_key(user_id).await?;
    Ok(Json(RoleResponse { role }))
}

/// GET /get_permissions_by_user_id_for_role
pub async fn get_permissions(
    State(state): State<SharedState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<PermissionsResponse>> {
    let user_id = query.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id is required".into()));
    }

    let permissions = state.principals.permissions(user_id).await?;
    Ok(Json(PermissionsResponse { permissions }))
}

/// GET /check_role_by_user_id
pub async fn check_role(
    State(state): State<SharedState>,
    Query(query): Query<RoleCheckQuery>,
) -> Result<Json<AllowedResponse>> {
    let user_id = query.user_id.trim();
    let role = query.role.trim();
    if user_id.is_empty() || role.is_empty() {
        return Err(AppError::Validation("user_id and role are required".into()));
    }

    let allowed = state.principals.check_role(user_id, role).await?;
    Ok(Json(AllowedResponse { allowed }))
}

/// GET /check_permission_by_user_id
pub async fn check_permission(
    State(state): State<SharedState>,
    Query(query): Query<PermissionCheckQuery>,
) -> Result<Json<AllowedResponse>> {
    let user_id = query.user_id.trim();
    let permission = query.permission.trim();
    if user_id.is_empty() || permission.is_empty() {
        return Err(AppError::Validation(
            "user_id and permission are required".into(),
        ));
    }

    let allowed = state.principals.check_permission(user_id, permission).await?;
    Ok(Json(AllowedResponse { allowed }))
}
