//! Per-sample arg-max extraction.

use crate::detector::types::{EmotionLabel, ExpressionSample, SampleError};

/// Reduce one sample to its highest-probability label.
///
/// Comparison is strictly greater, so the first label in iteration order wins
/// all ties. That is a defined tie-break policy shared with the voting
/// window's majority computation, not an accident of iteration.
///
/// Pure and total for non-empty, well-formed samples. An empty sample or a
/// negative/non-finite probability is a recoverable per-tick failure.
pub fn extract_arg_max(sample: &ExpressionSample) -> Result<EmotionLabel, SampleError> {
    let mut best: Option<(EmotionLabel, f64)> = None;

    for &(label, probability) in sample.entries() {
        if probability < 0.0 || !probability.is_finite() {
            return Err(SampleError::InvalidProbability {
                label,
                value: probability,
            });
        }
        match best {
            Some((_, top)) if probability <= top => {}
            _ => best = Some((label, probability)),
        }
    }

    best.map(|(label, _)| label).ok_or(SampleError::Empty)
}
