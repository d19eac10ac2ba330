//! Business logic services.

pub mod nats_listener;
pub mod principal_service;

pub use principal_service::PrincipalService;
