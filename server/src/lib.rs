//! Environmental dashboard backend.
//!
//! Downloads and caches public GeoJSON boundary files (Natural Earth) and
//! serves filtered, simplified subsets to the map frontend.
//!
//! # Endpoints
//! - `GET /api/boundaries/{level}[/{parentCode}]` — filtered boundaries
//! - `GET /api/data/status/{datasetKey}` — are all files downloaded
//! - `POST /api/data/download/{datasetKey}` — idempotent per-file download
//! - `DELETE /api/data/files` — clear all downloaded files
//!
//! Every response is JSON with a `success` flag. Boundary responses carry a
//! `version` token derived from file content that clients use for cache
//! invalidation.

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{delete, get, post},
    Router,
};
use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod boundaries;
pub mod cache;
pub mod config;
pub mod datasets;
pub mod error;
pub mod fetch;
pub mod routes;
pub mod state;

use routes::{
    boundaries_handler, boundaries_scoped_handler, clear_handler, download_handler, status_handler,
};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/boundaries/{level}", get(boundaries_handler))
        .route(
            "/api/boundaries/{level}/{parent_code}",
            get(boundaries_scoped_handler),
        )
        .route("/api/data/status/{dataset_key}", get(status_handler))
        .route("/api/data/download/{dataset_key}", post(download_handler))
        .route("/api/data/files", delete(clear_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Environmental Dashboard API running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
