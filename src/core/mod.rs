//! Core aggregation logic for the emosense agent.
//!
//! This module contains:
//! - Arg-max extraction from a single expression sample
//! - Windowed majority voting over per-tick labels
//! - The scheduler that drives the periodic sampling pipeline

pub mod argmax;
pub mod scheduler;
pub mod voting;

// Re-export commonly used types
pub use argmax::extract_arg_max;
pub use scheduler::{AggregationScheduler, SchedulerError, SchedulerState};
pub use voting::{StableEmotion, VotingWindow, DEFAULT_WINDOW_SIZE};
