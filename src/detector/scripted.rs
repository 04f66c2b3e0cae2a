//! Scripted sample source.
//!
//! Plays back a fixed sequence of per-tick outcomes so the pipeline can run
//! deterministically without a camera or model. Used by the test suite and
//! the bundled demo.

use crate::detector::types::{DetectorError, ExpressionSample};
use crate::detector::SampleSource;
use async_trait::async_trait;

/// A sample source that replays a scripted sequence.
///
/// Each entry is one tick's outcome: `Some(sample)` for a detection,
/// `None` for a no-face tick. Once the script is exhausted the source either
/// loops from the start or keeps answering `None`, depending on how it was
/// built.
pub struct ScriptedSource {
    script: Vec<Option<ExpressionSample>>,
    position: usize,
    looping: bool,
}

impl ScriptedSource {
    /// Play the script once, then report no face forever.
    pub fn new(script: Vec<Option<ExpressionSample>>) -> Self {
        Self {
            script,
            position: 0,
            looping: false,
        }
    }

    /// Play the script in a loop.
    pub fn looping(script: Vec<Option<ExpressionSample>>) -> Self {
        Self {
            script,
            position: 0,
            looping: true,
        }
    }

    /// Number of entries consumed so far (loops included).
    pub fn ticks_served(&self) -> usize {
        self.position
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    async fn next_sample(&mut self) -> Result<Option<ExpressionSample>, DetectorError> {
        if self.script.is_empty() {
            return Ok(None);
        }

        let index = if self.looping {
            self.position % self.script.len()
        } else if self.position < self.script.len() {
            self.position
        } else {
            return Ok(None);
        };

        self.position += 1;
        Ok(self.script[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::types::EmotionLabel;

    fn happy() -> ExpressionSample {
        ExpressionSample::new().with(EmotionLabel::Happy, 0.9)
    }

    #[tokio::test]
    async fn test_script_plays_once_then_dries_up() {
        let mut source = ScriptedSource::new(vec![Some(happy()), None]);

        assert!(source.next_sample().await.unwrap().is_some());
        assert!(source.next_sample().await.unwrap().is_none());
        assert!(source.next_sample().await.unwrap().is_none());
        assert_eq!(source.ticks_served(), 2);
    }

    #[tokio::test]
    async fn test_looping_script_repeats() {
        let mut source = ScriptedSource::looping(vec![Some(happy()), None]);

        for _ in 0..3 {
            assert!(source.next_sample().await.unwrap().is_some());
            assert!(source.next_sample().await.unwrap().is_none());
        }
    }
}
