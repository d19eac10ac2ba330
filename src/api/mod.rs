//! API module - HTTP handlers and shared state.

pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::pdp::DecisionPoint;
use crate::services::PrincipalService;
use crate::storage::{PgPolicyStore, PolicyStore};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub store: Arc<dyn PolicyStore>,
    pub principals: Arc<PrincipalService>,
    pub decisions: Arc<DecisionPoint>,
}

impl AppState {
    /// State backed by the relational store.
    pub fn new(config: Config, db: PgPool) -> Self {
        let store: Arc<dyn PolicyStore> = Arc::new(PgPolicyStore::new(db.clone()));
        Self::with_store(config, db, store)
    }

    /// State with an explicitly injected policy store. Tests use this to run
    /// the full surface against the in-memory backend.
    pub fn with_store(config: Config, db: PgPool, store: Arc<dyn PolicyStore>) -> Self {
        let principals = Arc::new(PrincipalService::new(store.clone()));
        let decisions = Arc::new(DecisionPoint::new(store.clone(), config.cache_ttl));
        Self {
            config,
            db,
            store,
            principals,
            decisions,
        }
    }
}

pub type SharedState = Arc<AppState>;
