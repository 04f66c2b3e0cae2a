//! Windowed majority voting over per-tick arg-max labels.
//!
//! The window is an explicit value owned by the scheduler instance, appended
//! once per detected tick and cleared in place when it fills. It is the whole
//! debouncing mechanism: a label only becomes "stable" by winning the vote
//! over one full window.

use crate::detector::types::EmotionLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of arg-max labels per voting window.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// The debounced output emitted once per completed window.
///
/// Transient event payload; the pipeline retains no copy after the
/// recommendation hand-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableEmotion {
    /// The winning label.
    pub label: EmotionLabel,
    /// How many of the window's entries voted for it.
    pub votes: usize,
    /// Size of the window that produced this result.
    pub window_size: usize,
    /// When the vote was decided.
    pub decided_at: DateTime<Utc>,
}

/// Bounded buffer of the last N arg-max labels.
///
/// Invariant: the buffer never holds more than `capacity` entries at any
/// observable point. The completing append computes the majority and clears
/// the buffer before returning, so a full window is never observable from
/// outside.
#[derive(Debug)]
pub struct VotingWindow {
    labels: Vec<EmotionLabel>,
    capacity: usize,
}

impl VotingWindow {
    /// Create a window with the given capacity. Capacity must be at least 1;
    /// a capacity of 1 makes every sample immediately stable.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "voting window capacity must be at least 1");
        Self {
            labels: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one label; on the append that fills the window, compute the
    /// majority, clear the buffer, and return the stable result.
    ///
    /// Append-then-check: the label always lands in the window before the
    /// capacity test, so no sample is silently dropped at the boundary.
    pub fn append(&mut self, label: EmotionLabel) -> Option<StableEmotion> {
        self.labels.push(label);

        if self.labels.len() < self.capacity {
            return None;
        }

        let stable = self.majority();
        self.labels.clear();
        Some(stable)
    }

    /// Majority label over the current (full) buffer.
    ///
    /// Counts are tallied in first-seen order and compared strictly greater,
    /// the same tie policy as arg-max extraction: on a tied count the label
    /// that entered the window first wins.
    fn majority(&self) -> StableEmotion {
        let mut tally: Vec<(EmotionLabel, usize)> = Vec::new();
        for &label in &self.labels {
            match tally.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => tally.push((label, 1)),
            }
        }

        // The buffer is non-empty here: append always precedes the call.
        let (mut best_label, mut best_count) = tally[0];
        for &(label, count) in &tally[1..] {
            if count > best_count {
                best_label = label;
                best_count = count;
            }
        }

        StableEmotion {
            label: best_label,
            votes: best_count,
            window_size: self.capacity,
            decided_at: Utc::now(),
        }
    }

    /// Number of labels currently buffered.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Configured window size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EmotionLabel::{Happy, Neutral, Sad};

    #[test]
    fn test_fills_then_resets() {
        let mut window = VotingWindow::new(3);

        assert!(window.append(Happy).is_none());
        assert_eq!(window.len(), 1);
        assert!(window.append(Happy).is_none());
        assert_eq!(window.len(), 2);

        let stable = window.append(Sad).expect("third append completes window");
        assert_eq!(stable.label, Happy);
        assert_eq!(stable.votes, 2);
        assert_eq!(stable.window_size, 3);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut window = VotingWindow::new(4);
        for i in 0..40 {
            window.append(Happy);
            assert!(window.len() <= 4, "overflow after append {i}");
        }
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_majority_determinism() {
        let mut window = VotingWindow::new(10);
        let sequence = [Happy, Happy, Sad, Happy, Neutral, Sad, Happy, Happy, Sad, Happy];

        let mut result = None;
        for label in sequence {
            if let Some(stable) = window.append(label) {
                assert!(result.is_none(), "window completed more than once");
                result = Some(stable);
            }
        }

        let stable = result.expect("window must complete after 10 appends");
        assert_eq!(stable.label, Happy);
        assert_eq!(stable.votes, 6);
    }

    #[test]
    fn test_tie_goes_to_first_in_insertion_order() {
        let mut window = VotingWindow::new(4);
        window.append(Happy);
        window.append(Happy);
        window.append(Sad);
        let stable = window.append(Sad).unwrap();

        // happy reaches the tied count first
        assert_eq!(stable.label, Happy);
        assert_eq!(stable.votes, 2);
    }

    #[test]
    fn test_capacity_one_is_immediately_stable() {
        let mut window = VotingWindow::new(1);
        let stable = window.append(Neutral).unwrap();
        assert_eq!(stable.label, Neutral);
        assert_eq!(stable.votes, 1);
        assert!(window.is_empty());
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn test_zero_capacity_is_rejected() {
        let _ = VotingWindow::new(0);
    }

    #[test]
    fn test_consecutive_windows_are_independent() {
        let mut window = VotingWindow::new(2);

        let first = window.append(Happy).is_none() && window.append(Happy).is_some();
        assert!(first);

        window.append(Sad);
        let second = window.append(Sad).unwrap();
        assert_eq!(second.label, Sad);
    }
}
