//! Entity catalogue: services, roles, permissions and their links.
//!
//! Identifiers are opaque strings end to end; the relational backend stores
//! them as UUIDs and casts to text at the query boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An external system registered within RBAC.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named bundle of permissions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The atomic capability: an action on a resource kind.
///
/// `resource_kind = "*"` means the action applies to any kind.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub action: String,
    pub resource_kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role-to-permission link; `resource_id` narrows the grant to one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermission {
    pub role_id: String,
    pub permission_id: String,
    pub resource_id: Option<String>,
}
