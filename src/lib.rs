//! Emosense Agent - debounced emotion output from noisy expression streams.
//!
//! This library periodically samples a facial-expression classifier's
//! per-frame probability vectors and turns them into a stable emotion label:
//! each tick's sample is reduced to its arg-max label, labels are collected
//! into a fixed-size voting window, and the window's majority vote is emitted
//! as the debounced result that drives a playlist recommendation. The raw
//! sample additionally feeds a percentage bar-chart projection on every tick.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Emosense Agent                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────────┐         │
//! │  │  Detector  │──▶│  Scheduler  │──▶│ VotingWindow │         │
//! │  │ (external) │   │ (1s ticks)  │   │ (majority)   │         │
//! │  └────────────┘   └─────────────┘   └──────────────┘         │
//! │                          │                  │                │
//! │                          ▼                  ▼                │
//! │                   ┌────────────┐   ┌────────────────┐        │
//! │                   │   Chart    │   │ Recommendation │        │
//! │                   │ Projection │   │    Trigger     │        │
//! │                   └────────────┘   └────────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use emosense_agent::{AggregationScheduler, ScriptedSource};
//!
//! # async fn run() {
//! let mut scheduler = AggregationScheduler::new(Duration::from_millis(1000), 10);
//! scheduler
//!     .start(ScriptedSource::new(vec![]))
//!     .expect("Failed to start scheduler");
//! # }
//! ```

pub mod chart;
pub mod config;
pub mod core;
pub mod detector;
pub mod recommend;
pub mod telemetry;

#[cfg(feature = "playlist")]
pub mod playlist;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use chart::{ChartData, ChartError, ChartSink, ConsoleChart, NullChart};
pub use config::{Config, ConfigError};
pub use core::{
    extract_arg_max, AggregationScheduler, SchedulerError, SchedulerState, StableEmotion,
    VotingWindow, DEFAULT_WINDOW_SIZE,
};
pub use detector::{
    ChannelSource, DetectedFace, DetectorError, DetectorSource, EmotionLabel, ExpressionSample,
    FaceDetector, SampleError, SampleSource, ScriptedSource,
};
pub use recommend::{NullRecommender, PlaylistRecommender, RecommendError, RecommendationTrigger};
pub use telemetry::{
    create_shared_stats, create_shared_stats_with_persistence, PipelineStats, SharedPipelineStats,
    StatsSnapshot,
};

// Playlist re-exports (when enabled)
#[cfg(feature = "playlist")]
pub use playlist::{
    BlockingPlaylistClient, HttpRecommender, PlaylistClient, PlaylistConfig, PlaylistError,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
