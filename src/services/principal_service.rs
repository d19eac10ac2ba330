//! Principal role assignment and permission lookups.

use std::sync::Arc;

use crate::error::Result;
use crate::models::Permission;
use crate::storage::PolicyStore;

/// Operations on a principal's role and derived permissions.
pub struct PrincipalService {
    store: Arc<dyn PolicyStore>,
}

impl PrincipalService {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Idempotently replace the principal's default-scope role.
    pub async fn assign_role(&self, principal_id: &str, role_key: &str) -> Result<()> {
        self.store
            .assign_default_role(principal_id, role_key.trim())
            .await
    }

    /// The principal's current role key, or the empty string.
    pub async fn role_key(&self, principal_id: &str) -> Result<String> {
        Ok(self
            .store
            .principal_role_key(principal_id)
            .await?
            .unwrap_or_default())
    }

    /// Whether the principal currently holds `role`. The empty role matches
    /// nothing.
    pub async fn check_role(&self, principal_id: &str, role: &str) -> Result<bool> {
        let current = self.role_key(principal_id).await?;
        Ok(!current.is_empty() && current == role.trim())
    }

    /// Permission identifiers for the principal's current role, in store
    /// order, duplicates dropped (first occurrence wins).
    pub async fn permissions(&self, principal_id: &str) -> Result<Vec<String>> {
        let role = self.role_key(principal_id).await?;
        if role.is_empty() {
            return Ok(Vec::new());
        }

        let permissions = self.store.list_permissions_for_role_key(&role).await?;
        let mut seen = std::collections::HashSet::new();
        let mut identifiers = Vec::with_capacity(permissions.len());
        for permission in &permissions {
            if let Some(identifier) = permission_identifier(permission) {
                if seen.insert(identifier.clone()) {
                    identifiers.push(identifier);
                }
            }
        }
        Ok(identifiers)
    }

    /// Whether the principal's role carries the given permission identifier.
    pub async fn check_permission(&self, principal_id: &str, permission: &str) -> Result<bool> {
        let permissions = self.permissions(principal_id).await?;
        Ok(permissions.iter().any(|p| p == permission))
    }
}

/// Format a permission as `action:resource_kind`; one-sided when a part is
/// empty, `None` when both are.
fn permission_identifier(permission: &Permission) -> Option<String> {
    match (
        permission.action.is_empty(),
        permission.resource_kind.is_empty(),
    ) {
        (true, true) => None,
        (false, false) => Some(format!(
            "{}:{}",
            permission.action, permission.resource_kind
        )),
        (false, true) => Some(permission.action.clone()),
        (true, false) => Some(permission.resource_kind.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPolicyStore;
    use chrono::Utc;

    fn permission(action: &str, resource_kind: &str) -> Permission {
        let now = Utc::now();
        Permission {
            id: "p".into(),
            action: action.into(),
            resource_kind: resource_kind.into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_identifier_formats() {
        assert_eq!(
            permission_identifier(&permission("read", "course")),
            Some("read:course".into())
        );
        assert_eq!(
            permission_identifier(&permission("read", "")),
            Some("read".into())
        );
        assert_eq!(
            permission_identifier(&permission("", "course")),
            Some("course".into())
        );
        assert_eq!(permission_identifier(&permission("", "")), None);
    }

    #[tokio::test]
    async fn test_assigned_role_is_readable() {
        let store = Arc::new(MemoryPolicyStore::new());
        let service = PrincipalService::new(store);

        service.assign_role("new-1", "user").await.unwrap();
        assert_eq!(service.role_key("new-1").await.unwrap(), "user");
        assert!(service.check_role("new-1", "user").await.unwrap());
        assert!(!service.check_role("new-1", "admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_role_reads_empty_and_matches_nothing() {
        let store = Arc::new(MemoryPolicyStore::new());
        let service = PrincipalService::new(store);

        assert_eq!(service.role_key("ghost").await.unwrap(), "");
        assert!(!service.check_role("ghost", "").await.unwrap());
        assert!(service.permissions("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permissions_deduplicate_preserving_order() {
        let store = Arc::new(MemoryPolicyStore::new());
        let write_doc = store.add_permission("write", "doc").await;
        let read_course = store.add_permission("read", "course").await;
        // A second permission formatting to the same identifier.
        let read_course_dup = store.add_permission("read", "course").await;
        store
            .link_role_permission("moderator", &write_doc.id)
            .await
            .unwrap();
        store
            .link_role_permission("moderator", &read_course.id)
            .await
            .unwrap();
        store
            .link_role_permission("moderator", &read_course_dup.id)
            .await
            .unwrap();

        let service = PrincipalService::new(store);
        service.assign_role("u1", "moderator").await.unwrap();

        let permissions = service.permissions("u1").await.unwrap();
        assert_eq!(permissions, vec!["read:course", "write:doc"]);
        assert!(service.check_permission("u1", "read:course").await.unwrap());
        assert!(!service.check_permission("u1", "delete:doc").await.unwrap());
    }
}
