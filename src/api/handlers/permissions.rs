//! Admin CRUD for permissions.

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::Deserialize;

use super::is_create_method;
use crate::api::dto::{Page, PageQuery};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::Permission;

/// Create permission routes. Creation is routed on `any` so the legacy
/// `SET` verb reaches the handler.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/permission", any(create))
        .route(
            "/permission/:id",
            get(get_by_id).put(update).delete(remove),
        )
        .route("/permission-list", get(list))
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub resource_kind: String,
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionRequest {
    pub action: Option<String>,
    pub resource_kind: Option<String>,
}

/// Create a permission
pub async fn create(
    method: Method,
    State(state): State<SharedState>,
    payload: Option<Json<CreatePermissionRequest>>,
) -> Result<(StatusCode, Json<Permission>)> {
    if !is_create_method(&method) {
        return Err(AppError::NotFound("unsupported method".into()));
    }
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };

    let permission: Permission = sqlx::query_as(
        "INSERT INTO permission (action, resource_kind)
         VALUES ($1, $2)
         RETURNING id::text AS id, action, resource_kind, created_at, updated_at",
    )
    .bind(payload.action.trim())
    .bind(payload.resource_kind.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

/// Get a permission by id
pub async fn get_by_id(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Permission>> {
    let permission: Option<Permission> = sqlx::query_as(
        "SELECT id::text AS id, action, resource_kind, created_at, updated_at
         FROM permission WHERE id::text = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    permission
        .map(Json)
        .ok_or_else(|| AppError::NotFound("permission not found".into()))
}

/// Partially update a permission
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Option<Json<UpdatePermissionRequest>>,
) -> Result<StatusCode> {
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };
    if payload.action.is_none() && payload.resource_kind.is_none() {
        return Err(AppError::Validation("no updates supplied".into()));
    }

    let current: Option<Permission> = sqlx::query_as(
        "SELECT id::text AS id, action, resource_kind, created_at, updated_at
         FROM permission WHERE id::text = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;
    let current = current.ok_or_else(|| AppError::NotFound("permission not found".into()))?;

    let action = payload.action.unwrap_or(current.action);
    let resource_kind = payload.resource_kind.unwrap_or(current.resource_kind);

    sqlx::query(
        "UPDATE permission SET action = $2, resource_kind = $3, updated_at = now()
         WHERE id::text = $1",
    )
    .bind(&id)
    .bind(action)
    .bind(resource_kind)
    .execute(&state.db)
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a permission
pub async fn remove(State(state): State<SharedState>, Path(id): Path<String>) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM permission WHERE id::text = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("permission not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List permissions, paginated and ordered by action then kind
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Permission>>> {
    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM permission")
        .fetch_one(&state.db)
        .await?;

    let items: Vec<Permission> = sqlx::query_as(
        "SELECT id::text AS id, action, resource_kind, created_at, updated_at
         FROM permission ORDER BY action, resource_kind LIMIT $1 OFFSET $2",
    )
    .bind(query.limit())
    .bind(query.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(Page::new(&query, total, items)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserializes() {
        let request: CreatePermissionRequest =
            serde_json::from_str(r#"{"action": "read", "resource_kind": "course"}"#).unwrap();
        assert_eq!(request.action, "read");
        assert_eq!(request.resource_kind, "course");
    }

    #[test]
    fn test_update_request_partial() {
        let request: UpdatePermissionRequest =
            serde_json::from_str(r#"{"action": "write"}"#).unwrap();
        assert_eq!(request.action.as_deref(), Some("write"));
        assert!(request.resource_kind.is_none());

        let request: UpdatePermissionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.action.is_none() && request.resource_kind.is_none());
    }
}
