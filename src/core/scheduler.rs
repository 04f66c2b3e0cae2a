//! Periodic sampling and pipeline orchestration.
//!
//! One tokio task drives the whole aggregation cycle: poll the sample source,
//! forward the raw sample to the chart, extract the arg-max label, vote, and
//! hand completed windows to the recommendation trigger. Every collaborator
//! failure is contained within its tick; the next tick is the retry
//! mechanism.

use crate::chart::ChartSink;
use crate::core::argmax::extract_arg_max;
use crate::core::voting::VotingWindow;
use crate::detector::SampleSource;
use crate::recommend::RecommendationTrigger;
use crate::telemetry::{create_shared_stats, SharedPipelineStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Lifecycle state of a scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    NotStarted,
    Running,
    Stopped,
}

/// Errors surfaced by [`AggregationScheduler::start`].
#[derive(Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start` was called while the tick loop is already running.
    AlreadyRunning,
    /// The sampling interval is zero.
    ZeroInterval,
    /// The voting window size is zero.
    ZeroWindowSize,
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::AlreadyRunning => write!(f, "scheduler is already running"),
            SchedulerError::ZeroInterval => write!(f, "sampling interval must be non-zero"),
            SchedulerError::ZeroWindowSize => write!(f, "voting window size must be at least 1"),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// Drives periodic sampling at a fixed interval and owns the voting window.
///
/// The window size and interval are fixed per instance; reconfiguring either
/// means stopping and starting a scheduler, which also discards any
/// in-progress window.
pub struct AggregationScheduler {
    sample_interval: Duration,
    window_size: usize,
    chart: Arc<dyn ChartSink>,
    recommender: Arc<dyn RecommendationTrigger>,
    stats: SharedPipelineStats,
    state: SchedulerState,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl AggregationScheduler {
    /// Create a scheduler with no-op sinks and fresh telemetry.
    pub fn new(sample_interval: Duration, window_size: usize) -> Self {
        Self {
            sample_interval,
            window_size,
            chart: Arc::new(crate::chart::NullChart),
            recommender: Arc::new(crate::recommend::NullRecommender),
            stats: create_shared_stats(),
            state: SchedulerState::NotStarted,
            shutdown: None,
            handle: None,
        }
    }

    /// Set the chart sink that receives every raw sample.
    pub fn with_chart(mut self, chart: Arc<dyn ChartSink>) -> Self {
        self.chart = chart;
        self
    }

    /// Set the trigger invoked with each completed window's stable emotion.
    pub fn with_recommender(mut self, recommender: Arc<dyn RecommendationTrigger>) -> Self {
        self.recommender = recommender;
        self
    }

    /// Share externally owned telemetry counters.
    pub fn with_stats(mut self, stats: SharedPipelineStats) -> Self {
        self.stats = stats;
        self
    }

    /// Begin the repeating tick loop on the current tokio runtime.
    ///
    /// Ticks run strictly one at a time: each tick's async work is awaited
    /// before the next timer firing is taken, and firings that elapse during
    /// a slow tick are skipped rather than replayed in a burst.
    pub fn start<S>(&mut self, source: S) -> Result<(), SchedulerError>
    where
        S: SampleSource + 'static,
    {
        if self.state == SchedulerState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }
        if self.sample_interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        if self.window_size == 0 {
            return Err(SchedulerError::ZeroWindowSize);
        }

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(tick_loop(
            source,
            VotingWindow::new(self.window_size),
            self.sample_interval,
            self.chart.clone(),
            self.recommender.clone(),
            self.stats.clone(),
            rx,
        ));

        self.shutdown = Some(tx);
        self.handle = Some(handle);
        self.state = SchedulerState::Running;
        info!(
            interval_ms = self.sample_interval.as_millis() as u64,
            window_size = self.window_size,
            "aggregation scheduler started"
        );
        Ok(())
    }

    /// Stop the tick loop.
    ///
    /// Idempotent: calling twice, or before `start`, is a no-op. An in-flight
    /// detection call is not cancelled, but its results are discarded rather
    /// than posted after the stop.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
            info!("aggregation scheduler stopped");
        }
        if self.state == SchedulerState::Running {
            self.state = SchedulerState::Stopped;
        }
    }

    /// Wait for the tick loop task to finish after [`stop`](Self::stop).
    pub async fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Telemetry counters for this scheduler.
    pub fn stats(&self) -> SharedPipelineStats {
        self.stats.clone()
    }
}

impl Drop for AggregationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_loop<S: SampleSource>(
    mut source: S,
    mut window: VotingWindow,
    period: Duration,
    chart: Arc<dyn ChartSink>,
    recommender: Arc<dyn RecommendationTrigger>,
    stats: SharedPipelineStats,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let stop_probe = shutdown.clone();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                run_tick(
                    &mut source,
                    &mut window,
                    chart.as_ref(),
                    recommender.as_ref(),
                    &stats,
                    &stop_probe,
                )
                .await;
            }
        }
    }
}

/// One sampling/aggregation cycle. Side-effect order is fixed: chart update
/// before the voting append.
async fn run_tick<S: SampleSource>(
    source: &mut S,
    window: &mut VotingWindow,
    chart: &dyn ChartSink,
    recommender: &dyn RecommendationTrigger,
    stats: &SharedPipelineStats,
    shutdown: &watch::Receiver<bool>,
) {
    let sample = match source.next_sample().await {
        Ok(Some(sample)) => sample,
        Ok(None) => {
            // No face this tick: nothing is charted, nothing is voted.
            stats.record_tick_skipped();
            return;
        }
        Err(e) => {
            warn!("sample source failed, skipping tick: {e}");
            stats.record_tick_invalid();
            return;
        }
    };

    // stop() may have arrived while the detection call was in flight;
    // a stopped scheduler must not post stale results.
    if *shutdown.borrow() {
        return;
    }

    if let Err(e) = chart.render(&sample) {
        warn!("chart sink failed: {e}");
    }

    let label = match extract_arg_max(&sample) {
        Ok(label) => label,
        Err(e) => {
            warn!("invalid sample, skipping tick: {e}");
            stats.record_tick_invalid();
            return;
        }
    };
    stats.record_tick_sampled();

    if let Some(stable) = window.append(label) {
        stats.record_window_completed();
        info!(
            label = %stable.label,
            votes = stable.votes,
            window_size = stable.window_size,
            "stable emotion decided"
        );
        match recommender.trigger(&stable) {
            Ok(()) => stats.record_recommendation(),
            Err(e) => warn!("recommendation trigger failed: {e}"),
        }
    }
}
