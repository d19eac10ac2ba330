//! Principal-side records: role assignments, overrides, superadmins.

use serde::{Deserialize, Serialize};

use crate::pdp::scope::Scope;

/// The kind of identity making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    User,
    ServiceAccount,
    Group,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::ServiceAccount => "service_account",
            Self::Group => "group",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "service_account" => Some(Self::ServiceAccount),
            "group" => Some(Self::Group),
            _ => None,
        }
    }
}

/// Effect of a principal override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideEffect {
    Allow,
    Deny,
}

impl OverrideEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// A role held by a principal at a given scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalRole {
    pub principal_id: String,
    pub principal_kind: PrincipalKind,
    pub role_id: String,
    pub scope: Scope,
    /// Services this grant is limited to; enforced only when non-empty.
    /// Carried per assignment, alongside the scope.
    pub service_ids: Vec<String>,
}

/// Per-principal, per-permission carve-out evaluated ahead of role grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalOverride {
    pub principal_id: String,
    pub principal_kind: PrincipalKind,
    pub permission_id: String,
    pub effect: OverrideEffect,
    pub scope: Scope,
}

/// Membership means every request from this principal is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperadminPrincipal {
    pub principal_id: String,
    pub principal_kind: PrincipalKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_kind_round_trip() {
        for kind in [
            PrincipalKind::User,
            PrincipalKind::ServiceAccount,
            PrincipalKind::Group,
        ] {
            assert_eq!(PrincipalKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PrincipalKind::parse("robot"), None);
    }

    #[test]
    fn test_principal_kind_serde() {
        let json = serde_json::to_string(&PrincipalKind::ServiceAccount).unwrap();
        assert_eq!(json, r#""service_account""#);
        let kind: PrincipalKind = serde_json::from_str(r#""group""#).unwrap();
        assert_eq!(kind, PrincipalKind::Group);
    }

    #[test]
    fn test_override_effect_parse() {
        assert_eq!(OverrideEffect::parse("allow"), Some(OverrideEffect::Allow));
        assert_eq!(OverrideEffect::parse("deny"), Some(OverrideEffect::Deny));
        assert_eq!(OverrideEffect::parse("block"), None);
    }
}
