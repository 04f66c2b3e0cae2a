//! Playlist service client for stable-emotion recommendations.
//!
//! This module integrates with a local playlist service: each completed
//! voting window's stable emotion is posted as a recommendation event, and
//! the service answers with the playlist it queued. The pipeline treats the
//! whole exchange as fire-and-forget.

use crate::core::voting::StableEmotion;
use crate::recommend::{PlaylistRecommender, RecommendError, RecommendationTrigger};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Playlist service configuration.
#[derive(Debug, Clone)]
pub struct PlaylistConfig {
    /// Service host (default: 127.0.0.1)
    pub host: String,
    /// Service port
    pub port: u16,
    /// Bearer authentication token
    pub token: String,
}

impl PlaylistConfig {
    /// Create a new playlist service configuration.
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
        }
    }

    /// Load configuration from the agent runtime directory.
    ///
    /// Reads the port from `<data dir>/emosense-agent/runtime/playlist.port`
    /// and the token from `.../runtime/playlist.token`, the files the
    /// playlist service writes when it starts.
    pub fn from_runtime_dir() -> Result<Self, PlaylistError> {
        let runtime_dir = Self::default_runtime_dir()?;

        let port_path = runtime_dir.join("playlist.port");
        let token_path = runtime_dir.join("playlist.token");

        let port_str = std::fs::read_to_string(&port_path).map_err(|e| {
            PlaylistError::Config(format!(
                "Failed to read playlist port from {port_path:?}: {e}"
            ))
        })?;

        let port: u16 = port_str.trim().parse().map_err(|e| {
            PlaylistError::Config(format!("Invalid port number '{}': {}", port_str.trim(), e))
        })?;

        let token = std::fs::read_to_string(&token_path)
            .map_err(|e| {
                PlaylistError::Config(format!(
                    "Failed to read playlist token from {token_path:?}: {e}"
                ))
            })?
            .trim()
            .to_string();

        Ok(Self {
            host: "127.0.0.1".to_string(),
            port,
            token,
        })
    }

    fn default_runtime_dir() -> Result<PathBuf, PlaylistError> {
        dirs::data_local_dir()
            .map(|d| d.join("emosense-agent").join("runtime"))
            .ok_or_else(|| {
                PlaylistError::Config("Could not determine local data directory".to_string())
            })
    }

    /// Get the full service URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the recommendation endpoint URL.
    pub fn recommend_url(&self) -> String {
        format!("{}/v1/recommend", self.url())
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url())
    }
}

/// Playlist client error types.
#[derive(Debug)]
pub enum PlaylistError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for PlaylistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaylistError::Config(msg) => write!(f, "Playlist config error: {msg}"),
            PlaylistError::Network(msg) => write!(f, "Playlist network error: {msg}"),
            PlaylistError::Server { status, message } => {
                write!(f, "Playlist server error ({status}): {message}")
            }
            PlaylistError::Serialization(msg) => {
                write!(f, "Playlist serialization error: {msg}")
            }
        }
    }
}

impl std::error::Error for PlaylistError {}

/// Recommendation event posted to the playlist service.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationEvent {
    /// The stable emotion that completed a voting window
    pub emotion: StableEmotion,
    /// Playlist suggested by the agent-side mapping
    pub suggested_playlist: String,
    /// Device identifier
    pub device_id: String,
    /// Producer name
    pub source: String,
    /// Producer version
    pub version: String,
}

/// Response from the recommendation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistResponse {
    /// Processing status
    pub status: String,
    /// Playlist the service actually queued, if it reports one
    #[serde(default)]
    pub playlist: Option<String>,
}

/// Async client for the playlist service.
pub struct PlaylistClient {
    config: PlaylistConfig,
    client: reqwest::Client,
    device_id: String,
}

impl PlaylistClient {
    /// Create a new playlist client.
    pub fn new(config: PlaylistConfig) -> Result<Self, PlaylistError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| PlaylistError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Device ID from hostname + instance
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let device_id = format!(
            "emosense-{}-{}",
            hostname,
            &uuid::Uuid::new_v4().to_string()[..8]
        );

        Ok(Self {
            config,
            client,
            device_id,
        })
    }

    /// Create a client from runtime directory configuration.
    pub fn from_runtime() -> Result<Self, PlaylistError> {
        let config = PlaylistConfig::from_runtime_dir()?;
        Self::new(config)
    }

    /// Test connection to the playlist service.
    pub async fn test_connection(&self) -> Result<bool, PlaylistError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| PlaylistError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Post one stable emotion to the recommendation endpoint.
    pub async fn recommend(
        &self,
        stable: &StableEmotion,
    ) -> Result<PlaylistResponse, PlaylistError> {
        let event = RecommendationEvent {
            emotion: stable.clone(),
            suggested_playlist: PlaylistRecommender::playlist_for(stable.label).to_string(),
            device_id: self.device_id.clone(),
            source: "emosense-agent".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        let response = self
            .client
            .post(self.config.recommend_url())
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/json")
            .json(&event)
            .send()
            .await
            .map_err(|e| PlaylistError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PlaylistError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PlaylistError::Serialization(e.to_string()))
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Blocking playlist client for use in synchronous contexts.
pub struct BlockingPlaylistClient {
    inner: PlaylistClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingPlaylistClient {
    /// Create a new blocking playlist client.
    pub fn new(config: PlaylistConfig) -> Result<Self, PlaylistError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PlaylistError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: PlaylistClient::new(config)?,
            runtime,
        })
    }

    /// Test connection to the playlist service.
    pub fn test_connection(&self) -> Result<bool, PlaylistError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// Post one stable emotion to the recommendation endpoint.
    pub fn recommend(&self, stable: &StableEmotion) -> Result<PlaylistResponse, PlaylistError> {
        self.runtime.block_on(self.inner.recommend(stable))
    }

    /// Get the device ID.
    pub fn device_id(&self) -> &str {
        self.inner.device_id()
    }
}

/// [`RecommendationTrigger`] that posts to the playlist service.
///
/// The post itself is spawned onto the runtime and never awaited by the
/// pipeline: a slow or failing service costs a warning log line, nothing
/// more. Must be constructed and triggered inside a tokio runtime.
pub struct HttpRecommender {
    client: Arc<PlaylistClient>,
}

impl HttpRecommender {
    pub fn new(client: PlaylistClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl RecommendationTrigger for HttpRecommender {
    fn trigger(&self, stable: &StableEmotion) -> Result<(), RecommendError> {
        let client = self.client.clone();
        let stable = stable.clone();
        tokio::spawn(async move {
            match client.recommend(&stable).await {
                Ok(response) => {
                    if let Some(playlist) = response.playlist {
                        tracing::info!(emotion = %stable.label, %playlist, "playlist queued");
                    }
                }
                Err(e) => tracing::warn!("playlist service rejected recommendation: {e}"),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_config_urls() {
        let config = PlaylistConfig::new("127.0.0.1", 8080, "test-token");
        assert_eq!(config.url(), "http://127.0.0.1:8080");
        assert_eq!(config.recommend_url(), "http://127.0.0.1:8080/v1/recommend");
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/health");
    }

    #[test]
    fn test_client_device_id_shape() {
        let config = PlaylistConfig::new("127.0.0.1", 8080, "test-token");
        let client = PlaylistClient::new(config).unwrap();
        assert!(client.device_id().starts_with("emosense-"));
    }
}
