//! Chart projection of raw expression samples.
//!
//! The chart is a pure view: every tick's sample is projected to a
//! label→percentage dataset and handed to whatever sink renders it. No
//! aggregation state lives here; rendering the same sample twice produces
//! the same output.

use crate::detector::types::{EmotionLabel, ExpressionSample};
use serde::{Deserialize, Serialize};

/// One bar of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: EmotionLabel,
    /// Probability scaled to a percentage, rounded to 2 decimals.
    pub percent: f64,
}

/// A full chart dataset for one sample, in the sample's entry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub bars: Vec<ChartBar>,
}

impl ChartData {
    /// Fixed upper bound of the percentage axis.
    pub const Y_MAX: f64 = 100.0;

    /// Project a sample to percentages. Pure function of its input.
    pub fn project(sample: &ExpressionSample) -> Self {
        let bars = sample
            .entries()
            .iter()
            .map(|&(label, probability)| ChartBar {
                label,
                percent: round2(probability * 100.0),
            })
            .collect();
        Self { bars }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Downstream chart failures; caught and logged by the scheduler, never
/// propagated into the tick loop.
#[derive(Debug)]
pub struct ChartError(pub String);

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "chart error: {}", self.0)
    }
}

impl std::error::Error for ChartError {}

/// The display boundary the scheduler forwards every raw sample to.
pub trait ChartSink: Send + Sync {
    fn render(&self, sample: &ExpressionSample) -> Result<(), ChartError>;
}

/// Renders the projection as ASCII bars on stdout.
pub struct ConsoleChart {
    width: usize,
}

impl ConsoleChart {
    /// Create a console chart with the given maximum bar width in columns.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }
}

impl Default for ConsoleChart {
    fn default() -> Self {
        Self::new(40)
    }
}

impl ChartSink for ConsoleChart {
    fn render(&self, sample: &ExpressionSample) -> Result<(), ChartError> {
        let data = ChartData::project(sample);
        println!("expression percentages:");
        for bar in &data.bars {
            let filled =
                ((bar.percent / ChartData::Y_MAX) * self.width as f64).round() as usize;
            let filled = filled.min(self.width);
            println!(
                "  {:<9} {:>6.2}% |{}{}|",
                bar.label,
                bar.percent,
                "#".repeat(filled),
                " ".repeat(self.width - filled)
            );
        }
        Ok(())
    }
}

/// Headless no-op sink.
pub struct NullChart;

impl ChartSink for NullChart {
    fn render(&self, _sample: &ExpressionSample) -> Result<(), ChartError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_scales_and_rounds() {
        let sample = ExpressionSample::new()
            .with(EmotionLabel::Happy, 0.91234)
            .with(EmotionLabel::Neutral, 0.0456);

        let data = ChartData::project(&sample);
        assert_eq!(data.bars.len(), 2);
        assert_eq!(data.bars[0].label, EmotionLabel::Happy);
        assert_eq!(data.bars[0].percent, 91.23);
        assert_eq!(data.bars[1].percent, 4.56);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let sample = ExpressionSample::new()
            .with(EmotionLabel::Sad, 0.333333)
            .with(EmotionLabel::Angry, 0.666667);

        let first = ChartData::project(&sample);
        let second = ChartData::project(&sample);
        assert_eq!(first, second);
    }

    #[test]
    fn test_projection_preserves_entry_order() {
        let sample = ExpressionSample::new()
            .with(EmotionLabel::Surprised, 0.2)
            .with(EmotionLabel::Happy, 0.8);

        let data = ChartData::project(&sample);
        assert_eq!(data.bars[0].label, EmotionLabel::Surprised);
        assert_eq!(data.bars[1].label, EmotionLabel::Happy);
    }

    #[test]
    fn test_console_chart_accepts_full_scale() {
        let chart = ConsoleChart::new(10);
        let sample = ExpressionSample::new().with(EmotionLabel::Happy, 1.0);
        assert!(chart.render(&sample).is_ok());
    }
}
