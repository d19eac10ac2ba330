//! Scope algebra: matching and specificity over the four-component lattice.

use serde::{Deserialize, Serialize};

use crate::pdp::CheckRequest;

/// A four-tuple of optional identifiers. An absent component means "any";
/// a present component must be matched exactly by the request.
///
/// Storage backends normalise their sentinel representation of "absent"
/// before a scope is constructed, so values here are always real identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub tenant_id: Option<String>,
    pub service_id: Option<String>,
    pub resource_kind: Option<String>,
    pub resource_id: Option<String>,
}

impl Scope {
    /// A scope matches a request iff every present component is present and
    /// equal on the request. A request without a tenant does not satisfy a
    /// scope that requires one; the same holds for service and resource id.
    pub fn matches(&self, req: &CheckRequest) -> bool {
        if let Some(tenant_id) = &self.tenant_id {
            match &req.tenant_id {
                Some(t) if t == tenant_id => {}
                _ => return false,
            }
        }
        if let Some(service_id) = &self.service_id {
            match &req.service_id {
                Some(s) if s == service_id => {}
                _ => return false,
            }
        }
        if let Some(resource_kind) = &self.resource_kind {
            if *resource_kind != req.resource_kind {
                return false;
            }
        }
        if let Some(resource_id) = &self.resource_id {
            match &req.resource_id {
                Some(r) if r == resource_id => {}
                _ => return false,
            }
        }
        true
    }

    /// Weighted sum over present components. The weights are powers of ten,
    /// so the 16 possible scope shapes map to 16 distinct scores and override
    /// selection never ties.
    ///
    /// The tenant weight is dead in single-tenant deployments (no surface
    /// writes tenant-scoped records) but stays part of the formula.
    pub fn specificity(&self) -> u32 {
        let mut score = 0;
        if self.tenant_id.is_some() {
            score += 1000;
        }
        if self.service_id.is_some() {
            score += 100;
        }
        if self.resource_kind.is_some() {
            score += 10;
        }
        if self.resource_id.is_some() {
            score += 1;
        }
        score
    }
}
