//! Policy storage backends.
//!
//! One read/write contract, pluggable backends injected at composition time:
//! Postgres in production, in-memory for tests and local development.
//! Decision-side reads never raise "not found"; absent data reads as empty.
//! Write-side operations surface missing role keys and permission ids as a
//! distinguished [`crate::error::AppError::NotFound`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{OverrideEffect, Permission, PrincipalKind};
use crate::pdp::scope::Scope;
use crate::pdp::CheckRequest;

pub use memory::MemoryPolicyStore;
pub use postgres::PgPolicyStore;

/// The override selected for a request, carrying the winning scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideMatch {
    pub effect: OverrideEffect,
    pub permission_id: String,
    pub scope: Scope,
}

/// A role resolved for a principal, with the scope it was granted at and an
/// optional set of services the role is limited to (enforced only when
/// non-empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWithScope {
    pub role_id: String,
    pub role_key: String,
    pub scope: Scope,
    pub service_ids: Vec<String>,
}

/// One permission linked to a resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionItem {
    pub role_id: String,
    pub role_key: String,
    pub permission_id: String,
    pub action: String,
    pub resource_kind: String,
    pub resource_id: Option<String>,
}

/// Read/write contract consumed by the decision engine and the principal
/// role assignment flow.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// True when the principal is registered as a superadmin.
    async fn is_superadmin(&self, principal_id: &str, kind: PrincipalKind) -> Result<bool>;

    /// The most specific override matching the request, if any. Specificity
    /// scoring guarantees a unique winner among distinct scopes.
    async fn find_override(&self, req: &CheckRequest) -> Result<Option<OverrideMatch>>;

    /// Every role the principal holds whose scope matches the request, in a
    /// stable order. The engine reports role keys in this order.
    async fn resolve_roles(&self, req: &CheckRequest) -> Result<Vec<RoleWithScope>>;

    /// All permissions linked to the given roles, in a stable order.
    async fn list_permissions_for_roles(
        &self,
        role_ids: &[String],
    ) -> Result<Vec<RolePermissionItem>>;

    /// Replace the principal's default-scope role assignment atomically.
    /// Fails with `NotFound` when the role key does not exist.
    async fn assign_default_role(&self, principal_id: &str, role_key: &str) -> Result<()>;

    /// The principal's role key: the default-scope row when present,
    /// otherwise the lexicographically smallest key over any of the
    /// principal's rows (kept for data predating default-scope writes).
    async fn principal_role_key(&self, principal_id: &str) -> Result<Option<String>>;

    /// Permissions linked to a role key, ordered by action then resource
    /// kind. An unknown key reads as an empty list.
    async fn list_permissions_for_role_key(&self, role_key: &str) -> Result<Vec<Permission>>;

    /// Link a permission to a role at the default resource scope. Fails with
    /// `NotFound` when either side does not exist; relinking is a no-op.
    async fn link_role_permission(&self, role_key: &str, permission_id: &str) -> Result<()>;
}

/// A stored override before selection, as both backends materialise it.
#[derive(Debug, Clone)]
pub(crate) struct OverrideCandidate {
    pub effect: OverrideEffect,
    pub permission_id: String,
    pub action: String,
    pub resource_kind: String,
    pub scope: Scope,
}

/// Select the highest-specificity candidate whose permission and scope match
/// the request. Ties (identical scopes) keep the first candidate seen.
pub(crate) fn most_specific_override(
    candidates: impl IntoIterator<Item = OverrideCandidate>,
    req: &CheckRequest,
) -> Option<OverrideMatch> {
    let mut best: Option<(u32, OverrideMatch)> = None;
    for candidate in candidates {
        if candidate.action != req.action || candidate.resource_kind != req.resource_kind {
            continue;
        }
        if !candidate.scope.matches(req) {
            continue;
        }
        let score = candidate.scope.specificity();
        let replace = match &best {
            Some((best_score, _)) => score > *best_score,
            None => true,
        };
        if replace {
            best = Some((
                score,
                OverrideMatch {
                    effect: candidate.effect,
                    permission_id: candidate.permission_id,
                    scope: candidate.scope,
                },
            ));
        }
    }
    best.map(|(_, winner)| winner)
}
