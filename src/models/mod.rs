//! Domain models for the RBAC entity catalogue and principal records.

pub mod catalog;
pub mod principal;

pub use catalog::{Permission, Role, RolePermission, Service};
pub use principal::{
    OverrideEffect, PrincipalKind, PrincipalOverride, PrincipalRole, SuperadminPrincipal,
};
