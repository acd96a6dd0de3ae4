//! Photo Match Server
//!
//! Single-slot photo admission service: an uploaded photo replaces the
//! current one only if it is similar enough to it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         PHOTO MATCH                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────────┐   ┌────────────────┐  │
//! │  │  Upload    │──▶│ Admission Engine │──▶│ Similarity     │  │
//! │  │  Handler   │   │ (score, decide)  │   │ Scorer         │  │
//! │  └────────────┘   └────────┬─────────┘   └────────────────┘  │
//! │  ┌────────────┐            │                                 │
//! │  │  Admin     │──┐         ▼                                 │
//! │  │  Handler   │  │   ┌────────────┐   ┌──────────────────┐   │
//! │  └────────────┘  └──▶│ Threshold  │   │ Photo Slot       │   │
//! │                      │ Store      │   │ (Blob Store)     │   │
//! │                      └────────────┘   └──────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod logic;
mod models;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};
pub use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let json_logs = config.json_logs();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "photo_match=debug,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Photo Match server starting...");
    tracing::info!(
        data_dir = %config.data_dir.display(),
        environment = %config.environment,
        "Configuration loaded"
    );
    if config.is_production() && config.static_dir.is_none() {
        tracing::warn!("STATIC_DIR not set, only the API will be served");
    }

    // Build application state
    let state = AppState::open(config.clone()).await?;

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutting down...");
    state.shutdown();
    Ok(())
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/photo", get(handlers::photo::current))
        .route("/api/upload", axum::routing::post(handlers::upload::upload))
        .route(
            "/api/admin/threshold",
            get(handlers::admin::get_threshold).post(handlers::admin::set_threshold),
        )
        .route("/status", get(handlers::health::check))
        .route("/health", get(handlers::health::check));

    let mut router = Router::new()
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    // Serve the built client for everything else
    if let Some(dir) = &state.config.static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
