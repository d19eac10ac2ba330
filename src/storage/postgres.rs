//! Relational policy store backed by Postgres.
//!
//! Unscoped components are persisted as sentinel values; this module is the
//! only place that knows them. Every read normalises sentinels to `None`
//! before data crosses into the scope algebra or the engine.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::error::{AppError, Result};
use crate::models::{OverrideEffect, Permission, PrincipalKind};
use crate::pdp::scope::Scope;
use crate::pdp::CheckRequest;

use super::{
    most_specific_override, OverrideCandidate, OverrideMatch, PolicyStore, RolePermissionItem,
    RoleWithScope,
};

/// Sentinel values the schema stores for unscoped components.
mod sentinel {
    pub const TENANT_ID: &str = "00000000-0000-0000-0000-000000000000";
    pub const SERVICE_ID: &str = "00000000-0000-0000-0000-000000000100";
    pub const RESOURCE_ID: &str = "00000000-0000-0000-0000-000000000000";
    pub const RESOURCE_KIND: &str = "global";
}

/// Normalise a stored component: the sentinel (or an empty string) is "any".
fn component(value: String, sentinel: &str) -> Option<String> {
    if value.is_empty() || value == sentinel {
        None
    } else {
        Some(value)
    }
}

fn scope_from_row(
    tenant_id: String,
    service_id: String,
    resource_kind: String,
    resource_id: String,
) -> Scope {
    Scope {
        tenant_id: component(tenant_id, sentinel::TENANT_ID),
        service_id: component(service_id, sentinel::SERVICE_ID),
        resource_kind: component(resource_kind, sentinel::RESOURCE_KIND),
        resource_id: component(resource_id, sentinel::RESOURCE_ID),
    }
}

/// Postgres-backed [`PolicyStore`].
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn role_id_by_key(&self, role_key: &str) -> Result<String> {
        let role_id: Option<String> =
            sqlx::query_scalar("SELECT id::text FROM role WHERE key = $1")
                .bind(role_key)
                .fetch_optional(&self.pool)
                .await?;
        role_id.ok_or_else(|| AppError::NotFound("role not found".into()))
    }
}

#[derive(FromRow)]
struct OverrideRow {
    permission_id: String,
    effect: String,
    tenant_id: String,
    service_id: String,
    resource_kind: String,
    resource_id: String,
    action: String,
    permission_resource_kind: String,
}

#[derive(FromRow)]
struct PrincipalRoleRow {
    role_id: String,
    role_key: String,
    tenant_id: String,
    service_id: String,
    resource_kind: String,
    resource_id: String,
    service_ids: Vec<String>,
}

#[derive(FromRow)]
struct RolePermissionRow {
    role_id: String,
    role_key: String,
    permission_id: String,
    action: String,
    resource_kind: String,
    resource_id: String,
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn is_superadmin(&self, principal_id: &str, kind: PrincipalKind) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM superadmin_principal
                WHERE principal_id = $1 AND principal_kind = $2
            )",
        )
        .bind(principal_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_override(&self, req: &CheckRequest) -> Result<Option<OverrideMatch>> {
        let rows: Vec<OverrideRow> = sqlx::query_as(
            "SELECT po.permission_id::text AS permission_id,
                    po.effect,
                    po.tenant_id::text AS tenant_id,
                    po.service_id::text AS service_id,
                    po.resource_kind,
                    po.resource_id::text AS resource_id,
                    p.action,
                    p.resource_kind AS permission_resource_kind
             FROM principal_override po
             JOIN permission p ON p.id = po.permission_id
             WHERE po.principal_id = $1 AND po.principal_kind = $2
             ORDER BY po.created_at",
        )
        .bind(&req.principal_id)
        .bind(req.principal_kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let effect = OverrideEffect::parse(&row.effect).ok_or_else(|| {
                AppError::Internal(format!("unknown override effect: {}", row.effect))
            })?;
            candidates.push(OverrideCandidate {
                effect,
                permission_id: row.permission_id,
                action: row.action,
                resource_kind: row.permission_resource_kind,
                scope: scope_from_row(
                    row.tenant_id,
                    row.service_id,
                    row.resource_kind,
                    row.resource_id,
                ),
            });
        }
        Ok(most_specific_override(candidates, req))
    }

    async fn resolve_roles(&self, req: &CheckRequest) -> Result<Vec<RoleWithScope>> {
        // service_ids is a column of the assignment row: the restriction
        // belongs to this grant, not to the role globally.
        let rows: Vec<PrincipalRoleRow> = sqlx::query_as(
            "SELECT r.id::text AS role_id,
                    r.key AS role_key,
                    pr.tenant_id::text AS tenant_id,
                    pr.service_id::text AS service_id,
                    pr.resource_kind,
                    pr.resource_id::text AS resource_id,
                    pr.service_ids::text[] AS service_ids
             FROM principal_role pr
             JOIN role r ON r.id = pr.role_id
             WHERE pr.principal_id = $1 AND pr.principal_kind = $2
             ORDER BY r.key, pr.tenant_id, pr.service_id, pr.resource_kind, pr.resource_id",
        )
        .bind(&req.principal_id)
        .bind(req.principal_kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut roles = Vec::new();
        for row in rows {
            let scope = scope_from_row(
                row.tenant_id,
                row.service_id,
                row.resource_kind,
                row.resource_id,
            );
            if !scope.matches(req) {
                continue;
            }
            roles.push(RoleWithScope {
                role_id: row.role_id,
                role_key: row.role_key,
                scope,
                service_ids: row.service_ids,
            });
        }
        Ok(roles)
    }

    async fn list_permissions_for_roles(
        &self,
        role_ids: &[String],
    ) -> Result<Vec<RolePermissionItem>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<RolePermissionRow> = sqlx::query_as(
            "SELECT rp.role_id::text AS role_id,
                    r.key AS role_key,
                    p.id::text AS permission_id,
                    p.action,
                    p.resource_kind,
                    rp.resource_id::text AS resource_id
             FROM role_permission rp
             JOIN role r ON r.id = rp.role_id
             JOIN permission p ON p.id = rp.permission_id
             WHERE rp.role_id::text = ANY($1)
             ORDER BY r.key, p.action, p.resource_kind",
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| RolePermissionItem {
                role_id: row.role_id,
                role_key: row.role_key,
                permission_id: row.permission_id,
                action: row.action,
                resource_kind: row.resource_kind,
                resource_id: component(row.resource_id, sentinel::RESOURCE_ID),
            })
            .collect())
    }

    async fn assign_default_role(&self, principal_id: &str, role_key: &str) -> Result<()> {
        let role_id = self.role_id_by_key(role_key).await?;

        // Delete and insert must commit together or the one-default-row
        // invariant breaks under concurrent assignment.
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM principal_role
             WHERE principal_id = $1 AND principal_kind = $2
               AND tenant_id = $3::uuid AND service_id = $4::uuid
               AND resource_kind = $5 AND resource_id = $6::uuid",
        )
        .bind(principal_id)
        .bind(PrincipalKind::User.as_str())
        .bind(sentinel::TENANT_ID)
        .bind(sentinel::SERVICE_ID)
        .bind(sentinel::RESOURCE_KIND)
        .bind(sentinel::RESOURCE_ID)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO principal_role
                 (principal_id, principal_kind, role_id, tenant_id, service_id, resource_kind, resource_id)
             VALUES ($1, $2, $3::uuid, $4::uuid, $5::uuid, $6, $7::uuid)",
        )
        .bind(principal_id)
        .bind(PrincipalKind::User.as_str())
        .bind(&role_id)
        .bind(sentinel::TENANT_ID)
        .bind(sentinel::SERVICE_ID)
        .bind(sentinel::RESOURCE_KIND)
        .bind(sentinel::RESOURCE_ID)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn principal_role_key(&self, principal_id: &str) -> Result<Option<String>> {
        let default_key: Option<String> = sqlx::query_scalar(
            "SELECT r.key
             FROM principal_role pr
             JOIN role r ON r.id = pr.role_id
             WHERE pr.principal_id = $1 AND pr.principal_kind = $2
               AND pr.tenant_id = $3::uuid AND pr.service_id = $4::uuid
               AND pr.resource_kind = $5 AND pr.resource_id = $6::uuid
             LIMIT 1",
        )
        .bind(principal_id)
        .bind(PrincipalKind::User.as_str())
        .bind(sentinel::TENANT_ID)
        .bind(sentinel::SERVICE_ID)
        .bind(sentinel::RESOURCE_KIND)
        .bind(sentinel::RESOURCE_ID)
        .fetch_optional(&self.pool)
        .await?;

        if default_key.is_some() {
            return Ok(default_key);
        }

        // Historical rows may predate default-scope writes; fall back to the
        // smallest role key over any of the principal's assignments.
        let fallback: Option<String> = sqlx::query_scalar(
            "SELECT r.key
             FROM principal_role pr
             JOIN role r ON r.id = pr.role_id
             WHERE pr.principal_id = $1 AND pr.principal_kind = $2
             ORDER BY r.key
             LIMIT 1",
        )
        .bind(principal_id)
        .bind(PrincipalKind::User.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(fallback)
    }

    async fn list_permissions_for_role_key(&self, role_key: &str) -> Result<Vec<Permission>> {
        let permissions: Vec<Permission> = sqlx::query_as(
            "SELECT p.id::text AS id, p.action, p.resource_kind, p.created_at, p.updated_at
             FROM role_permission rp
             JOIN role r ON r.id = rp.role_id
             JOIN permission p ON p.id = rp.permission_id
             WHERE r.key = $1
             ORDER BY p.action, p.resource_kind",
        )
        .bind(role_key)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn link_role_permission(&self, role_key: &str, permission_id: &str) -> Result<()> {
        let role_id = self.role_id_by_key(role_key).await?;

        let permission_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM permission WHERE id::text = $1)")
                .bind(permission_id)
                .fetch_one(&self.pool)
                .await?;
        if !permission_exists {
            return Err(AppError::NotFound("permission not found".into()));
        }

        sqlx::query(
            "INSERT INTO role_permission (role_id, permission_id, resource_id)
             VALUES ($1::uuid, $2::uuid, $3::uuid)
             ON CONFLICT DO NOTHING",
        )
        .bind(&role_id)
        .bind(permission_id)
        .bind(sentinel::RESOURCE_ID)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
