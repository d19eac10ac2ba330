//! In-process policy store for tests and local development.
//!
//! Holds already-normalised records (scope components are `Option`s, never
//! sentinels) behind a single read/write lock. Seeded with the same default
//! roles the relational migration creates.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Permission, PrincipalKind, PrincipalOverride, PrincipalRole, Role, RolePermission,
    SuperadminPrincipal,
};
use crate::pdp::scope::Scope;
use crate::pdp::CheckRequest;

use super::{
    most_specific_override, OverrideCandidate, OverrideMatch, PolicyStore, RolePermissionItem,
    RoleWithScope,
};

const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("admin", "Admin"),
    ("moderator", "Moderator"),
    ("teacher", "Teacher"),
    ("student", "Student"),
    ("user", "User"),
    ("guest", "Guest"),
];

#[derive(Default)]
struct State {
    roles: HashMap<String, Role>,
    roles_by_key: HashMap<String, String>,
    permissions: HashMap<String, Permission>,
    role_permissions: Vec<RolePermission>,
    principal_roles: Vec<PrincipalRole>,
    overrides: Vec<PrincipalOverride>,
    superadmins: Vec<SuperadminPrincipal>,
}

impl State {
    fn insert_role(&mut self, key: &str, title: &str) -> Role {
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4().to_string(),
            key: key.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.roles_by_key.insert(role.key.clone(), role.id.clone());
        self.roles.insert(role.id.clone(), role.clone());
        role
    }
}

/// Memory-backed [`PolicyStore`].
pub struct MemoryPolicyStore {
    state: RwLock<State>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        let mut state = State::default();
        for (key, title) in DEFAULT_ROLES {
            state.insert_role(key, title);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Register a role, replacing any prior role with the same key.
    pub async fn add_role(&self, key: &str, title: &str) -> Role {
        let mut state = self.state.write().await;
        state.insert_role(key, title)
    }

    /// Register a permission.
    pub async fn add_permission(&self, action: &str, resource_kind: &str) -> Permission {
        let now = Utc::now();
        let permission = Permission {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            resource_kind: resource_kind.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state
            .permissions
            .insert(permission.id.clone(), permission.clone());
        permission
    }

    /// Mark a principal as superadmin.
    pub async fn add_superadmin(&self, principal_id: &str, kind: PrincipalKind) {
        let mut state = self.state.write().await;
        state.superadmins.push(SuperadminPrincipal {
            principal_id: principal_id.to_string(),
            principal_kind: kind,
        });
    }

    /// Record a per-principal override.
    pub async fn add_override(&self, record: PrincipalOverride) {
        let mut state = self.state.write().await;
        state.overrides.push(record);
    }

    /// Grant a role to a principal at an explicit scope.
    pub async fn add_scoped_role(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
        role_key: &str,
        scope: Scope,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let role_id = state
            .roles_by_key
            .get(role_key)
            .cloned()
            .ok_or_else(|| AppError::NotFound("role not found".into()))?;
        state.principal_roles.push(PrincipalRole {
            principal_id: principal_id.to_string(),
            principal_kind: kind,
            role_id,
            scope,
            service_ids: Vec::new(),
        });
        Ok(())
    }

    /// Limit one principal's grant of a role to a set of services. The
    /// restriction lands on that principal's assignment rows only; other
    /// holders of the same role are untouched.
    pub async fn limit_assignment_services(
        &self,
        principal_id: &str,
        kind: PrincipalKind,
        role_key: &str,
        service_ids: &[&str],
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let role_id = state
            .roles_by_key
            .get(role_key)
            .cloned()
            .ok_or_else(|| AppError::NotFound("role not found".into()))?;

        let mut touched = false;
        for row in state.principal_roles.iter_mut() {
            if row.principal_id == principal_id
                && row.principal_kind == kind
                && row.role_id == role_id
            {
                row.service_ids = service_ids.iter().map(|s| s.to_string()).collect();
                touched = true;
            }
        }
        if !touched {
            return Err(AppError::NotFound(
                "principal role assignment not found".into(),
            ));
        }
        Ok(())
    }

    /// Role keys currently assigned to the principal, default scope only.
    /// Test helper for asserting assignment idempotence.
    pub async fn default_scope_role_keys(&self, principal_id: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .principal_roles
            .iter()
            .filter(|row| {
                row.principal_id == principal_id
                    && row.principal_kind == PrincipalKind::User
                    && row.scope == Scope::default()
            })
            .filter_map(|row| state.roles.get(&row.role_id).map(|role| role.key.clone()))
            .collect()
    }
}

impl Default for MemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn is_superadmin(&self, principal_id: &str, kind: PrincipalKind) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .superadmins
            .iter()
            .any(|sa| sa.principal_id == principal_id && sa.principal_kind == kind))
    }

    async fn find_override(&self, req: &CheckRequest) -> Result<Option<OverrideMatch>> {
        let state = self.state.read().await;
        let candidates: Vec<OverrideCandidate> = state
            .overrides
            .iter()
            .filter(|o| {
                o.principal_id == req.principal_id && o.principal_kind == req.principal_kind
            })
            .filter_map(|o| {
                let permission = state.permissions.get(&o.permission_id)?;
                Some(OverrideCandidate {
                    effect: o.effect,
                    permission_id: o.permission_id.clone(),
                    action: permission.action.clone(),
                    resource_kind: permission.resource_kind.clone(),
                    scope: o.scope.clone(),
                })
            })
            .collect();
        Ok(most_specific_override(candidates, req))
    }

    async fn resolve_roles(&self, req: &CheckRequest) -> Result<Vec<RoleWithScope>> {
        let state = self.state.read().await;
        let mut resolved = Vec::new();
        for row in &state.principal_roles {
            if row.principal_id != req.principal_id || row.principal_kind != req.principal_kind {
                continue;
            }
            if !row.scope.matches(req) {
                continue;
            }
            let Some(role) = state.roles.get(&row.role_id) else {
                continue;
            };
            resolved.push(RoleWithScope {
                role_id: role.id.clone(),
                role_key: role.key.clone(),
                scope: row.scope.clone(),
                service_ids: row.service_ids.clone(),
            });
        }
        Ok(resolved)
    }

    async fn list_permissions_for_roles(
        &self,
        role_ids: &[String],
    ) -> Result<Vec<RolePermissionItem>> {
        let state = self.state.read().await;
        let mut items = Vec::new();
        for link in &state.role_permissions {
            if !role_ids.contains(&link.role_id) {
                continue;
            }
            let (Some(role), Some(permission)) = (
                state.roles.get(&link.role_id),
                state.permissions.get(&link.permission_id),
            ) else {
                continue;
            };
            items.push(RolePermissionItem {
                role_id: role.id.clone(),
                role_key: role.key.clone(),
                permission_id: permission.id.clone(),
                action: permission.action.clone(),
                resource_kind: permission.resource_kind.clone(),
                resource_id: link.resource_id.clone(),
            });
        }
        Ok(items)
    }

    async fn assign_default_role(&self, principal_id: &str, role_key: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let role_id = state
            .roles_by_key
            .get(role_key)
            .cloned()
            .ok_or_else(|| AppError::NotFound("role not found".into()))?;

        state.principal_roles.retain(|row| {
            !(row.principal_id == principal_id
                && row.principal_kind == PrincipalKind::User
                && row.scope == Scope::default())
        });
        state.principal_roles.push(PrincipalRole {
            principal_id: principal_id.to_string(),
            principal_kind: PrincipalKind::User,
            role_id,
            scope: Scope::default(),
            service_ids: Vec::new(),
        });
        Ok(())
    }

    async fn principal_role_key(&self, principal_id: &str) -> Result<Option<String>> {
        let state = self.state.read().await;

        let default_key = state
            .principal_roles
            .iter()
            .find(|row| {
                row.principal_id == principal_id
                    && row.principal_kind == PrincipalKind::User
                    && row.scope == Scope::default()
            })
            .and_then(|row| state.roles.get(&row.role_id))
            .map(|role| role.key.clone());
        if default_key.is_some() {
            return Ok(default_key);
        }

        let fallback = state
            .principal_roles
            .iter()
            .filter(|row| {
                row.principal_id == principal_id && row.principal_kind == PrincipalKind::User
            })
            .filter_map(|row| state.roles.get(&row.role_id))
            .map(|role| role.key.clone())
            .min();
        Ok(fallback)
    }

    async fn list_permissions_for_role_key(&self, role_key: &str) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        let Some(role_id) = state.roles_by_key.get(role_key) else {
            return Ok(Vec::new());
        };
        let mut permissions: Vec<Permission> = state
            .role_permissions
            .iter()
            .filter(|link| &link.role_id == role_id)
            .filter_map(|link| state.permissions.get(&link.permission_id).cloned())
            .collect();
        permissions.sort_by(|a, b| {
            a.action
                .cmp(&b.action)
                .then_with(|| a.resource_kind.cmp(&b.resource_kind))
        });
        Ok(permissions)
    }

    async fn link_role_permission(&self, role_key: &str, permission_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let role_id = state
            .roles_by_key
            .get(role_key)
            .cloned()
            .ok_or_else(|| AppError::NotFound("role not found".into()))?;
        if !state.permissions.contains_key(permission_id) {
            return Err(AppError::NotFound("permission not found".into()));
        }
        let link = RolePermission {
            role_id,
            permission_id: permission_id.to_string(),
            resource_id: None,
        };
        if !state.role_permissions.contains(&link) {
            state.role_permissions.push(link);
        }
        Ok(())
    }
}
