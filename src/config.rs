//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;
use std::time::Duration;

/// Read an environment variable, falling back to a default when unset or empty.
fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment label (dev, stage, prod)
    pub app_env: String,

    /// HTTP bind address; a bare ":port" binds all interfaces
    pub http_addr: String,

    /// Postgres connection string (required)
    pub db_dsn: String,

    /// NATS server URL; empty disables the bus surface
    pub nats_url: String,

    /// TTL for the decision cache
    pub cache_ttl: Duration,

    /// Reserved: expected issuer for moderator-auth tokens
    pub auth_moderator_iss: Option<String>,

    /// Reserved: expected audience for moderator-auth tokens
    pub auth_moderator_aud: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let cache_ttl_secs: u64 = env_or("CACHE_TTL_SECONDS", "60")
            .parse()
            .map_err(|_| AppError::Config("invalid CACHE_TTL_SECONDS".into()))?;

        Ok(Self {
            app_env: env_or("APP_ENV", "dev"),
            http_addr: env_or("HTTP_ADDR", ":8080"),
            db_dsn: env::var("DB_DSN").map_err(|_| AppError::Config("DB_DSN not set".into()))?,
            nats_url: env_or("NATS_URL", "nats://nats:4222"),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            auth_moderator_iss: env::var("AUTH_MODERATOR_JWT_ISS").ok(),
            auth_moderator_aud: env::var("AUTH_MODERATOR_JWT_AUD").ok(),
        })
    }

    /// Bind address in `host:port` form. A leading ":" means all interfaces.
    pub fn bind_address(&self) -> String {
        if self.http_addr.starts_with(':') {
            format!("0.0.0.0{}", self.http_addr)
        } else {
            self.http_addr.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_addr(addr: &str) -> Config {
        Config {
            app_env: "dev".into(),
            http_addr: addr.into(),
            db_dsn: "postgres://localhost/rbac".into(),
            nats_url: String::new(),
            cache_ttl: Duration::from_secs(60),
            auth_moderator_iss: None,
            auth_moderator_aud: None,
        }
    }

    #[test]
    fn test_bind_address_bare_port() {
        assert_eq!(config_with_addr(":8080").bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_bind_address_full() {
        assert_eq!(
            config_with_addr("127.0.0.1:9000").bind_address(),
            "127.0.0.1:9000"
        );
    }
}
