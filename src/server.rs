//! HTTP server for receiving detection batches from an external detector.
//!
//! The expression model typically runs where the camera is — a browser page
//! or a sidecar process. This server accepts its per-tick output and feeds
//! the aggregation pipeline through a channel-backed sample source:
//!
//! ```text
//! Browser detector ──→ POST /sample ──→ emosense-agent ──→ AggregationScheduler
//!                                            ↓
//!                                     [ChannelSource]
//! ```

use crate::detector::channel::{sample_channel, ChannelSource, SampleSender};
use crate::detector::types::DetectedFace;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Capacity of the detection queue between server and scheduler
    pub queue_depth: usize,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16) -> Self {
        Self {
            port,
            queue_depth: 256,
        }
    }
}

/// Shared server state
struct ServerState {
    /// Sending half of the detection queue
    sender: SampleSender,
}

/// Detection batch posted by the external detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePayload {
    /// Faces detected this tick; an empty list is a valid "no face" tick
    pub faces: Vec<DetectedFace>,
}

/// Response from the sample endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: String,
    /// Number of faces accepted into the queue
    pub queued: usize,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /sample
///
/// Accepts one detection batch and queues it for the next scheduler tick.
async fn sample(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<SamplePayload>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let queued = payload.faces.len();

    state.sender.try_send(payload.faces).map_err(|e| {
        tracing::warn!("detection queue rejected batch: {e}");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Detection queue is full or closed".to_string(),
                code: "QUEUE_UNAVAILABLE".to_string(),
            }),
        )
    })?;

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        queued,
    }))
}

/// Run the HTTP server.
///
/// Returns the bound address, a shutdown sender, and the [`ChannelSource`]
/// to hand to the scheduler.
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>, ChannelSource)> {
    let (sender, source) = sample_channel(config.queue_depth);
    let state = Arc::new(ServerState { sender });

    let app = Router::new()
        .route("/health", get(health))
        .route("/sample", post(sample))
        .layer(
            // Browser-hosted detectors post from arbitrary local origins.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("emosense ingest server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx, source))
}
