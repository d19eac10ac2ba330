//! Policy Decision Point: request/result types, the layered decision engine
//! and its TTL cache.
//!
//! The engine is a pure function of store state; the cache in front of it is
//! the only stateful piece. Both are owned values wired together at
//! composition time, never process globals.

pub mod cache;
pub mod engine;
pub mod scope;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::PrincipalKind;
use crate::storage::PolicyStore;

use cache::DecisionCache;
use engine::Engine;

/// An authorisation question: may this principal perform `action` on a
/// resource of `resource_kind`, in the given scope?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub principal_id: String,
    pub principal_kind: PrincipalKind,
    pub tenant_id: Option<String>,
    pub service_id: Option<String>,
    pub action: String,
    pub resource_kind: String,
    pub resource_id: Option<String>,
    pub correlation_id: Option<String>,
}

impl CheckRequest {
    /// Cache key for this request. Covers principal identity, every scope
    /// component, action and resource kind/id; the correlation id is
    /// deliberately excluded so retraced requests share an entry.
    pub fn fingerprint(&self) -> String {
        fn part(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("\u{0}")
        }

        [
            self.principal_id.as_str(),
            self.principal_kind.as_str(),
            part(&self.tenant_id),
            part(&self.service_id),
            self.action.as_str(),
            self.resource_kind.as_str(),
            part(&self.resource_id),
        ]
        .join("\u{1f}")
    }
}

/// Which layer produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Superadmin,
    Override,
    Role,
    Deny,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Override => "override",
            Self::Role => "role",
            Self::Deny => "deny",
        }
    }
}

/// The decision together with its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub allow: bool,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// The engine fronted by its TTL cache. Failed checks are never cached;
/// writes elsewhere do not invalidate entries, so readers may observe state
/// up to one TTL old.
pub struct DecisionPoint {
    engine: Engine,
    cache: DecisionCache,
}

impl DecisionPoint {
    pub fn new(store: Arc<dyn PolicyStore>, ttl: std::time::Duration) -> Self {
        Self {
            engine: Engine::new(store),
            cache: DecisionCache::new(ttl),
        }
    }

    /// Evaluate a request, consulting the cache first.
    pub async fn check(&self, req: &CheckRequest) -> Result<CheckResult> {
        let key = req.fingerprint();
        if let Some(hit) = self.cache.get(&key).await {
            return Ok(hit);
        }

        let result = self.engine.check(req).await?;
        self.cache.set(key, result.clone()).await;
        Ok(result)
    }
}
