//! Sample acquisition boundary for the emosense agent.
//!
//! The real face/expression model lives outside this crate (a camera pipeline,
//! a browser detector posting over HTTP, ...). Everything behind that boundary
//! is reached through one capability: [`SampleSource::next_sample`], which
//! yields zero or one [`ExpressionSample`] per tick.

pub mod channel;
pub mod scripted;
pub mod types;

use async_trait::async_trait;

// Re-export commonly used types
pub use channel::{sample_channel, ChannelSource, SampleSender};
pub use scripted::ScriptedSource;
pub use types::{DetectedFace, DetectorError, EmotionLabel, ExpressionSample, SampleError};

/// The one-method sampling capability the scheduler polls each tick.
///
/// `Ok(None)` means "no face this tick" and is an ordinary outcome, not an
/// error; the tick is skipped entirely.
#[async_trait]
pub trait SampleSource: Send {
    async fn next_sample(&mut self) -> Result<Option<ExpressionSample>, DetectorError>;
}

/// Contract of the external detection model: one call, a batch of detected
/// faces (possibly empty).
#[async_trait]
pub trait FaceDetector: Send {
    async fn detect(&mut self) -> Result<Vec<DetectedFace>, DetectorError>;
}

/// Adapter from a [`FaceDetector`] to a [`SampleSource`].
///
/// Only the first detected face feeds the aggregation pipeline; additional
/// faces are dropped here.
pub struct DetectorSource<D> {
    detector: D,
}

impl<D: FaceDetector> DetectorSource<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Consume the adapter and get the wrapped detector back.
    pub fn into_inner(self) -> D {
        self.detector
    }
}

#[async_trait]
impl<D: FaceDetector> SampleSource for DetectorSource<D> {
    async fn next_sample(&mut self) -> Result<Option<ExpressionSample>, DetectorError> {
        let faces = self.detector.detect().await?;
        Ok(faces.into_iter().next().map(|face| face.expressions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector {
        faces: Vec<DetectedFace>,
    }

    #[async_trait]
    impl FaceDetector for FixedDetector {
        async fn detect(&mut self) -> Result<Vec<DetectedFace>, DetectorError> {
            Ok(self.faces.clone())
        }
    }

    #[tokio::test]
    async fn test_detector_source_takes_first_face() {
        let first = ExpressionSample::new().with(EmotionLabel::Happy, 0.9);
        let second = ExpressionSample::new().with(EmotionLabel::Sad, 0.9);
        let mut source = DetectorSource::new(FixedDetector {
            faces: vec![DetectedFace::new(first.clone()), DetectedFace::new(second)],
        });

        let sample = source.next_sample().await.unwrap();
        assert_eq!(sample, Some(first));
    }

    #[tokio::test]
    async fn test_detector_source_empty_batch_is_none() {
        let mut source = DetectorSource::new(FixedDetector { faces: vec![] });
        assert_eq!(source.next_sample().await.unwrap(), None);
    }
}
