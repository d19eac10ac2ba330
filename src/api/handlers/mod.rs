//! HTTP handlers.

pub mod health;
pub mod permissions;
pub mod principals;
pub mod role_permissions;
pub mod roles;
pub mod services;

use axum::http::Method;

/// Entity creation rides the legacy `SET` wire verb; `POST` is accepted as
/// the canonical equivalent.
pub(crate) fn is_create_method(method: &Method) -> bool {
    method.as_str() == "SET" || *method == Method::POST
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_methods() {
        assert!(is_create_method(&Method::from_bytes(b"SET").unwrap()));
        assert!(is_create_method(&Method::POST));
        assert!(!is_create_method(&Method::GET));
        assert!(!is_create_method(&Method::PUT));
    }
}
