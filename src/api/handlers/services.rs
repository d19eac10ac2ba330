//! Admin CRUD for the service registry.

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
use crate::models::Service;

/// Create service routes. Creation is routed on `any` so the legacy `SET`
/// verb reaches the handler.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/service", any(create))
        .route(
            "/service/:id",
            get(get_by_id).put(update).delete(remove),
        )
        .route("/service-list", get(list))
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    #[serde(default)]
    pub title: String,
}

/// Create a service
pub async fn create(
    method: Method,
    State(state): State<SharedState>,
    payload: Option<Json<CreateServiceRequest>>,
) -> Result<(StatusCode, Json<Service>)> {
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

    let service: Service = sqlx::query_as(
        "INSERT INTO service (key, title)
         VALUES ($1, $2)
         RETURNING id::text AS id, key, title, created_at, updated_at",
    )
    .bind(key)
    .bind(payload.title.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(service)))
}

/// Get a service by id
pub async fn get_by_id(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Service>> {
    let service: Option<Service> = sqlx::query_as(
        "SELECT id::text AS id, key, title, created_at, updated_at
         FROM service WHERE id::text = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db)
    .await?;

    service
        .map(Json)
        .ok_or_else(|| AppError::NotFound("service not found".into()))
}

/// Rename a service (title only)
pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Option<Json<UpdateServiceRequest>>,
) -> Result<StatusCode> {
    let Some(Json(payload)) = payload else {
        return Err(AppError::Validation("invalid payload".into()));
    };

    let result = sqlx::query("UPDATE service SET title = $2, updated_at = now() WHERE id::text = $1")
        .bind(&id)
        .bind(payload.title.trim())
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("service not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a service
pub async fn remove(State(state): State<SharedState>, Path(id): Path<String>) -> Result<StatusCode> {
    let result = sqlx::query("DELETE FROM service WHERE id::text = $1")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("service not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List services, paginated and ordered by key
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Service>>> {
    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM service")
        .fetch_one(&state.db)
        .await?;

    let items: Vec<Service> = sqlx::query_as(
        "SELECT id::text AS id, key, title, created_at, updated_at
         FROM service ORDER BY key LIMIT $1 OFFSET $2",
    )
    .bind(query.limit())
    .bind(query.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(Page::new(&query, total, items)))
}
