//! Request approval workflow HTTP server.
//!
//! Wires the PostgreSQL stores, the lifecycle engine, and the query
//! layer into an Axum application with tracing and correlation-id
//! layers, then serves it with graceful shutdown.

mod config;

use axum::{routing::get, Router};
use config::Config;
use request_service::directory::UserDirectory;
use request_service::handlers::AppState;
use request_service::lifecycle::RequestLifecycle;
use request_service::providers::SystemClock;
use request_service::query::RequestQueries;
use request_service::router::{request_router, users_router};
use request_service::stores::postgres::{PostgresRequestRepository, PostgresUserRepository};
use request_service::PaginationConfig;
use request_service_web::correlation_id_layer;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_service=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Request Approval Service");

    // Load configuration
    let config = Config::from_env();
    info!(
        postgres_url = %config.postgres.url,
        page_size = config.pagination.page_size,
        "Configuration loaded"
    );

    // Connect to the store
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await?;
    info!("Database connected");

    let requests = PostgresRequestRepository::new(pool.clone());
    let users = PostgresUserRepository::new(pool);

    info!("Running migrations...");
    requests.migrate().await?;
    info!("Migrations complete");

    // Build the domain layers and shared state
    let pagination = PaginationConfig::new(config.pagination.page_size);
    let state = AppState::new(
        RequestLifecycle::new(requests.clone(), users.clone(), Arc::new(SystemClock)),
        RequestQueries::new(requests, users.clone(), pagination),
        UserDirectory::new(users),
    );

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/request", request_router(state.clone()))
        .nest("/users", users_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer());

    // Create server address
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Liveness probe; no identity required.
async fn health_check() -> &'static str {
    "ok"
}

/// Readiness probe; no identity required.
async fn readiness_check() -> &'static str {
    "ready"
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
