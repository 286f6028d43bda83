use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{error, info};

use super::{
    services::{
        convert_link, create_host, delete_host, health, list_hosts, metrics, test_host,
        update_host, upload_base64, upload_multiple, upload_single,
    },
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes over `state`, with the request body cap from config
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_bytes.as_usize();

    Router::new()
        .route("/upload/single", post(upload_single))
        .route("/upload/multiple", post(upload_multiple))
        .route("/upload/base64", post(upload_base64))
        .route("/upload/convert-link", post(convert_link))
        .route("/upload/image-hosts", get(list_hosts).post(create_host))
        .route("/upload/image-hosts/{id}", put(update_host).delete(delete_host))
        .route("/upload/image-hosts/{id}/test", post(test_host))
        .route("/operators/health", get(health))
        .route("/operators/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        // Transparently decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

pub async fn run(address: SocketAddr, config: Config) -> Result<(), AnyError> {
    let state = AppState::open(config).map_err(|e| format!("Failed to start: {e}"))?;
    let registry = state.registry.clone();
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "imgrelay API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = registry.persist() {
        error!(error = %e, "Failed to persist host store on shutdown");
    } else {
        info!("Host store persisted");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
