//! Admin CRUD for roles.

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
use crate::models::Role;

/// Create role routes. Creation is routed on `any` so the legacy `SET`
/// verb reaches the handler.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/role", any(create))
        .route("/role/:id", get(get_by_id).put(update).delete(remove))
        .route("/role-list", get(list))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub title: String,
}

/// Create a role
pub async fn create(
    method: Method,
    State(state): State<SharedState>,
    payload: Option<Json<CreateRoleRequest>>,
) -> Result<(StatusCode, Json<Role>)> {
    if !is_create_method(&method) {
        return Err(AppError::NotFound("unsupported method".into()));
    }
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };
    let key = payload.key.trim();
    if key.is_empty() {
        return Err(AppError::Validation("key is required".into()));
    }

    let role: Role = sqlx::query_as(
        "INSERT INTO role (key, title)
         VALUES ($1, $2)
         RETURNING id::text AS id, key, title, created_at, updated_at",
    )
    .bind(key)
    .bind(payload.title.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

/// Get a role by id
pub async fn get_by_id(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Role>> {
    let role: Option<Role> = sqlx::query_as(
        "SELECT id::text AS id, key, title, created_at, updated_at
         FROM role WHERE id::text = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    role.map(Json)
        .ok_or_else(|| AppError::NotFound("role not found".into()))
}

/// Rename a role (title only)
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Option<Json<UpdateRoleRequest>>,
) -> Result<StatusCode> {
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };

    let result = sqlx::query("UPDATE role SET title = $2, updated_at = now() WHERE id::text = $1")
        .bind(&id)
        .bind(payload.title.trim())
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("role not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a role
pub async fn remove(State(state): State<SharedState>, Path(id): Path<String>) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM role WHERE id::text = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("role not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List roles, paginated and ordered by key
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Role>>> {
    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM role")
        .fetch_one(&state.db)
        .await?;

    let items: Vec<Role> = sqlx::query_as(
        "SELECT id::text AS id, key, title, created_at, updated_at
         FROM role ORDER BY key LIMIT $1 OFFSET $2",
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
        let request: CreateRoleRequest =
            serde_json::from_str(r#"{"key": "moderator", "title": "Moderator"}"#).unwrap();
        assert_eq!(request.key, "moderator");
        assert_eq!(request.title, "Moderator");
    }

    #[test]
    fn test_update_request_tolerates_missing_title() {
        let request: UpdateRoleRequest = serde_json::from_str("{}").unwrap();
        assert!(request.title.is_empty());
    }
}
