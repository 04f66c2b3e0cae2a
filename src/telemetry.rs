//! Session telemetry for the sampling pipeline.
//!
//! Tracks per-session counters (ticks sampled/skipped, windows completed,
//! recommendations emitted) without retaining any sample content. Counters
//! can be persisted as JSON so `emosense status` can report across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Counters for the current pipeline session.
#[derive(Debug)]
pub struct PipelineStats {
    /// Ticks that produced a valid sample and fed the voting window
    ticks_sampled: AtomicU64,
    /// Ticks with no detected face
    ticks_skipped: AtomicU64,
    /// Ticks dropped because the source failed or the sample was malformed
    ticks_invalid: AtomicU64,
    /// Voting windows completed
    windows_completed: AtomicU64,
    /// Recommendations successfully handed off
    recommendations: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Unique id of this agent instance
    instance_id: Uuid,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl PipelineStats {
    /// Create fresh counters.
    pub fn new() -> Self {
        Self {
            ticks_sampled: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            ticks_invalid: AtomicU64::new(0),
            windows_completed: AtomicU64::new(0),
            recommendations: AtomicU64::new(0),
            session_start: Utc::now(),
            instance_id: Uuid::new_v4(),
            persist_path: None,
        }
    }

    /// Create counters that persist to disk, seeded from any previous run.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            eprintln!("Note: could not load previous telemetry: {e}");
        }

        stats
    }

    pub fn record_tick_sampled(&self) {
        self.ticks_sampled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_invalid(&self) {
        self.ticks_invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_completed(&self) {
        self.windows_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recommendation(&self) {
        self.recommendations.fetch_add(1, Ordering::Relaxed);
    }

    /// Unique id of this agent instance.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Snapshot the current counters.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks_sampled: self.ticks_sampled.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            ticks_invalid: self.ticks_invalid.load(Ordering::Relaxed),
            windows_completed: self.windows_completed.load(Ordering::Relaxed),
            recommendations: self.recommendations.load(Ordering::Relaxed),
            device_id: device_id(),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Human-readable session summary.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Ticks sampled: {}\n\
             - Ticks skipped (no face): {}\n\
             - Ticks dropped (invalid): {}\n\
             - Voting windows completed: {}\n\
             - Recommendations emitted: {}\n\
             - Session duration: {} seconds",
            stats.ticks_sampled,
            stats.ticks_skipped,
            stats.ticks_invalid,
            stats.windows_completed,
            stats.recommendations,
            stats.session_duration_secs
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                ticks_sampled: stats.ticks_sampled,
                ticks_skipped: stats.ticks_skipped,
                ticks_invalid: stats.ticks_invalid,
                windows_completed: stats.windows_completed,
                recommendations: stats.recommendations,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load counters from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.ticks_sampled
                    .store(persisted.ticks_sampled, Ordering::Relaxed);
                self.ticks_skipped
                    .store(persisted.ticks_skipped, Ordering::Relaxed);
                self.ticks_invalid
                    .store(persisted.ticks_invalid, Ordering::Relaxed);
                self.windows_completed
                    .store(persisted.windows_completed, Ordering::Relaxed);
                self.recommendations
                    .store(persisted.recommendations, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.ticks_sampled.store(0, Ordering::Relaxed);
        self.ticks_skipped.store(0, Ordering::Relaxed);
        self.ticks_invalid.store(0, Ordering::Relaxed);
        self.windows_completed.store(0, Ordering::Relaxed);
        self.recommendations.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Hostname-derived device identifier.
fn device_id() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Snapshot of pipeline counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ticks_sampled: u64,
    pub ticks_skipped: u64,
    pub ticks_invalid: u64,
    pub windows_completed: u64,
    pub recommendations: u64,
    pub device_id: String,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Counter format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    ticks_sampled: u64,
    ticks_skipped: u64,
    ticks_invalid: u64,
    windows_completed: u64,
    recommendations: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared pipeline stats.
pub type SharedPipelineStats = Arc<PipelineStats>;

/// Create a new shared stats handle.
pub fn create_shared_stats() -> SharedPipelineStats {
    Arc::new(PipelineStats::new())
}

/// Create a new shared stats handle with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedPipelineStats {
    Arc::new(PipelineStats::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulation() {
        let stats = PipelineStats::new();

        stats.record_tick_sampled();
        stats.record_tick_sampled();
        stats.record_tick_skipped();
        stats.record_window_completed();

        let snapshot = stats.stats();
        assert_eq!(snapshot.ticks_sampled, 2);
        assert_eq!(snapshot.ticks_skipped, 1);
        assert_eq!(snapshot.ticks_invalid, 0);
        assert_eq!(snapshot.windows_completed, 1);
    }

    #[test]
    fn test_reset_clears_counters() {
        let stats = PipelineStats::new();
        stats.record_tick_sampled();
        stats.record_recommendation();
        stats.reset();

        let snapshot = stats.stats();
        assert_eq!(snapshot.ticks_sampled, 0);
        assert_eq!(snapshot.recommendations, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = PipelineStats::new();
        let summary = stats.summary();

        assert!(summary.contains("Ticks sampled"));
        assert!(summary.contains("Voting windows completed"));
        assert!(summary.contains("Recommendations emitted"));
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(
            PipelineStats::new().instance_id(),
            PipelineStats::new().instance_id()
        );
    }
}
