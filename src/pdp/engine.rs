//! The layered decision engine: superadmin, then overrides, then role grants.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::Result;
use crate::models::OverrideEffect;
use crate::pdp::{CheckRequest, CheckResult, Decision};
use crate::storage::{PolicyStore, RolePermissionItem, RoleWithScope};

/// Evaluates authorisation requests against repository-backed policy data.
///
/// Each stage is terminal on a hit; a superadmin flag or an explicit override
/// short-circuits role evaluation entirely. Store failures abort the check:
/// a deny caused by a transient storage error could end up cached, which is
/// worse than surfacing the failure.
pub struct Engine {
    store: Arc<dyn PolicyStore>,
}

impl Engine {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Execute a single decision.
    pub async fn check(&self, req: &CheckRequest) -> Result<CheckResult> {
        // Stage 1: superadmin bypass.
        if self
            .store
            .is_superadmin(&req.principal_id, req.principal_kind)
            .await?
        {
            return Ok(CheckResult {
                allow: true,
                decision: Decision::Superadmin,
                role_keys: Vec::new(),
                correlation_id: req.correlation_id.clone(),
            });
        }

        // Stage 2: the most specific matching override, allow or deny.
        if let Some(winner) = self.store.find_override(req).await? {
            let allow = winner.effect == OverrideEffect::Allow;
            return Ok(CheckResult {
                allow,
                decision: if allow {
                    Decision::Override
                } else {
                    Decision::Deny
                },
                role_keys: Vec::new(),
                correlation_id: req.correlation_id.clone(),
            });
        }

        // Stage 3: roles whose scope covers the request.
        let roles = self.store.resolve_roles(req).await?;
        if roles.is_empty() {
            return Ok(CheckResult {
                allow: false,
                decision: Decision::Deny,
                role_keys: Vec::new(),
                correlation_id: req.correlation_id.clone(),
            });
        }

        // Stage 4: permission matching over the resolved roles.
        // Role keys are reported in store order; the store owns ordering.
        let mut seen = HashSet::new();
        let mut role_ids = Vec::new();
        let mut role_keys = Vec::with_capacity(roles.len());
        for role in &roles {
            if seen.insert(role.role_id.as_str()) {
                role_ids.push(role.role_id.clone());
            }
            role_keys.push(role.role_key.clone());
        }

        let items = self.store.list_permissions_for_roles(&role_ids).await?;
        let allow = permission_grants(&items, &roles, req);

        Ok(CheckResult {
            allow,
            decision: if allow { Decision::Role } else { Decision::Deny },
            role_keys,
            correlation_id: req.correlation_id.clone(),
        })
    }
}

/// True when any role-permission item satisfies every clause for the request.
fn permission_grants(
    items: &[RolePermissionItem],
    roles: &[RoleWithScope],
    req: &CheckRequest,
) -> bool {
    if items.is_empty() {
        return false;
    }

    let mut role_scopes = HashMap::new();
    let mut service_limits: HashMap<&str, Vec<&str>> = HashMap::new();
    for role in roles {
        role_scopes.insert(role.role_id.as_str(), &role.scope);
        if !role.service_ids.is_empty() {
            let mut ids: Vec<&str> = role.service_ids.iter().map(String::as_str).collect();
            ids.sort_unstable();
            service_limits.insert(role.role_id.as_str(), ids);
        }
    }

    for item in items {
        let Some(scope) = role_scopes.get(item.role_id.as_str()) else {
            continue;
        };
        if !scope.matches(req) {
            continue;
        }
        if let Some(limit) = service_limits.get(item.role_id.as_str()) {
            match &req.service_id {
                Some(service_id) => {
                    if limit.binary_search(&service_id.as_str()).is_err() {
                        continue;
                    }
                }
                None => continue,
            }
        }
        if item.action != req.action {
            continue;
        }
        if item.resource_kind != req.resource_kind && item.resource_kind != "*" {
            continue;
        }
        if let Some(resource_id) = &item.resource_id {
            match &req.resource_id {
                Some(r) if r == resource_id => {}
                _ => continue,
            }
        }
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrincipalKind;
    use crate::pdp::scope::Scope;

    fn request() -> CheckRequest {
        CheckRequest {
            principal_id: "u1".into(),
            principal_kind: PrincipalKind::User,
            tenant_id: None,
            service_id: Some("s1".into()),
            action: "read".into(),
            resource_kind: "course".into(),
            resource_id: Some("c1".into()),
            correlation_id: None,
        }
    }

    fn role(id: &str, service_ids: &[&str]) -> RoleWithScope {
        RoleWithScope {
            role_id: id.into(),
            role_key: format!("key-{id}"),
            scope: Scope::default(),
            service_ids: service_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn item(role_id: &str, action: &str, kind: &str, resource_id: Option<&str>) -> RolePermissionItem {
        RolePermissionItem {
            role_id: role_id.into(),
            role_key: format!("key-{role_id}"),
            permission_id: "p1".into(),
            action: action.into(),
            resource_kind: kind.into(),
            resource_id: resource_id.map(String::from),
        }
    }

    #[test]
    fn test_exact_action_and_kind_grant() {
        let roles = vec![role("r1", &[])];
        let items = vec![item("r1", "read", "course", None)];
        assert!(permission_grants(&items, &roles, &request()));
    }

    #[test]
    fn test_wildcard_kind_grants_any_kind() {
        let roles = vec![role("r1", &[])];
        let items = vec![item("r1", "read", "*", None)];
        assert!(permission_grants(&items, &roles, &request()));

        let concrete = vec![item("r1", "read", "doc", None)];
        assert!(!permission_grants(&concrete, &roles, &request()));
    }

    #[test]
    fn test_action_mismatch_denies() {
        let roles = vec![role("r1", &[])];
        let items = vec![item("r1", "write", "course", None)];
        assert!(!permission_grants(&items, &roles, &request()));
    }

    #[test]
    fn test_resource_id_clause() {
        let roles = vec![role("r1", &[])];
        assert!(permission_grants(
            &[item("r1", "read", "course", Some("c1"))],
            &roles,
            &request()
        ));
        assert!(!permission_grants(
            &[item("r1", "read", "course", Some("c2"))],
            &roles,
            &request()
        ));

        let mut no_resource = request();
        no_resource.resource_id = None;
        assert!(!permission_grants(
            &[item("r1", "read", "course", Some("c1"))],
            &roles,
            &no_resource
        ));
    }

    #[test]
    fn test_service_restriction_requires_membership() {
        let roles = vec![role("r1", &["s9", "s1", "s5"])];
        let items = vec![item("r1", "read", "course", None)];
        assert!(permission_grants(&items, &roles, &request()));

        let mut other_service = request();
        other_service.service_id = Some("s2".into());
        assert!(!permission_grants(&items, &roles, &other_service));

        let mut no_service = request();
        no_service.service_id = None;
        assert!(!permission_grants(&items, &roles, &no_service));
    }

    #[test]
    fn test_role_scope_must_cover_request() {
        let mut scoped = role("r1", &[]);
        scoped.scope = Scope {
            service_id: Some("s2".into()),
            ..Scope::default()
        };
        let items = vec![item("r1", "read", "course", None)];
        assert!(!permission_grants(&items, &[scoped], &request()));
    }

    #[test]
    fn test_item_for_unresolved_role_is_ignored() {
        let roles = vec![role("r1", &[])];
        let items = vec![item("r2", "read", "course", None)];
        assert!(!permission_grants(&items, &roles, &request()));
    }
}
