//! RBAC Service - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rbac_service::{api, config::Config, db, error::Result, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rbac_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(app_env = %config.app_env, "Starting RBAC service");

    // Connect to database
    let db_pool = db::create_pool(&config.db_dsn).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Create application state
    let state = Arc::new(api::AppState::new(config.clone(), db_pool));

    // Attach the message-bus surface. A missing bus degrades the service,
    // it does not stop it.
    if config.nats_url.is_empty() {
        tracing::info!("NATS_URL is empty, bus surface disabled");
    } else {
        match async_nats::connect(config.nats_url.as_str()).await {
            Ok(client) => {
                if let Err(err) =
                    services::nats_listener::spawn_listeners(client, state.principals.clone())
                        .await
                {
                    tracing::warn!(error = %err, "NATS subscribe failed, bus surface disabled");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "NATS connect failed, bus surface disabled");
            }
        }
    }

    // Build router
    let app = Router::new()
        .merge(api::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
