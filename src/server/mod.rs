//! HTTP surface: the upload page, `POST /upload`, `POST /process` and
//! `GET /download/{filename}`.

pub mod error;
pub mod handlers;

use crate::config::Config;
use crate::storage::UploadDir;
use crate::sweeper::Sweeper;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub uploads: UploadDir,
}

/// Build the router over `uploads`, limiting request bodies to
/// `max_content_length` bytes.
pub fn router(uploads: UploadDir, max_content_length: usize) -> Router {
    let state = Arc::new(AppState { uploads });

    Router::new()
        .route("/", get(handlers::index))
        .route("/static/js/main.js", get(handlers::main_js))
        .route("/upload", post(handlers::upload_files))
        .route("/process", post(handlers::process_files))
        .route("/download/{filename}", get(handlers::download_file))
        .layer(DefaultBodyLimit::max(max_content_length))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the upload directory, start the sweeper and serve until Ctrl+C or
/// SIGTERM.
pub async fn serve(config: &Config) -> Result<()> {
    let uploads = UploadDir::open(&config.upload_folder)?;

    let sweeper = Sweeper::new(uploads.root(), config.cleanup_interval, config.sweep_period).spawn();

    let app = router(uploads, config.max_content_length);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        upload_folder = %config.upload_folder.display(),
        retention_secs = config.cleanup_interval.as_secs(),
        sweep_period_secs = config.sweep_period.as_secs(),
        max_content_length = config.max_content_length,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or, on Unix, SIGTERM. If a handler cannot be
/// installed that signal is simply never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }

    tracing::info!("Shutting down gracefully...");
}
