//! Optional HTTP status server
//!
//! Exposes a running session's progress while a long mirror is underway:
//! - `GET /status` - in-flight operations and discovery counts
//! - `GET /errors` - every error recorded so far

use crate::crawler::Mirror;
use crate::state::ErrorEntry;
use crate::MirrorError;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Snapshot of a running session
#[derive(Debug, Clone, Serialize)]
pub struct MirrorStatus {
    pub in_flight: usize,
    pub galleries: usize,
    pub pictures: usize,
    pub errors: usize,
    pub halted: bool,
}

impl MirrorStatus {
    pub fn capture(mirror: &Mirror) -> Self {
        Self {
            in_flight: mirror.gate().in_flight(),
            galleries: mirror.registry().known_galleries(),
            pictures: mirror.registry().known_media(),
            errors: mirror.errors().len(),
            halted: mirror.is_halted(),
        }
    }
}

async fn status_handler(State(mirror): State<Mirror>) -> Json<MirrorStatus> {
    Json(MirrorStatus::capture(&mirror))
}

async fn errors_handler(State(mirror): State<Mirror>) -> Json<Vec<ErrorEntry>> {
    Json(mirror.errors().entries())
}

/// Builds the status router for a session
pub fn router(mirror: Mirror) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/errors", get(errors_handler))
        .with_state(mirror)
}

/// Serves the status router on an already bound listener
pub async fn serve_on(listener: TcpListener, mirror: Mirror) -> Result<(), MirrorError> {
    axum::serve(listener, router(mirror))
        .await
        .map_err(|e| MirrorError::Diagnostics(e.to_string()))
}

/// Binds `addr` and serves the status router until the process exits
pub async fn serve(addr: SocketAddr, mirror: Mirror) -> Result<(), MirrorError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| MirrorError::Diagnostics(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Listening on http://{}", addr);
    serve_on(listener, mirror).await
}

/// Starts the status server in the background
///
/// A server that fails to start is logged and otherwise ignored; the mirror
/// does not depend on it.
pub fn spawn(addr: SocketAddr, mirror: Mirror) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(addr, mirror).await {
            tracing::warn!("{}", e);
        }
    })
}
