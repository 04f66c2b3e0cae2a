//! Channel-backed sample source.
//!
//! An external detector process (the ingest server, a sidecar camera
//! pipeline) pushes detection batches into a bounded channel; the scheduler
//! polls the receiving end once per tick. The queue is drained on every poll
//! and only the most recent batch is sampled, so a slow tick never replays a
//! backlog of stale frames.

use crate::detector::types::{DetectedFace, DetectorError, ExpressionSample};
use crate::detector::SampleSource;
use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

/// Default capacity of the detection queue.
const DEFAULT_QUEUE_DEPTH: usize = 256;

/// Sending half handed to the detector process.
pub type SampleSender = Sender<Vec<DetectedFace>>;

/// Create a connected sender/source pair with the given queue depth.
pub fn sample_channel(queue_depth: usize) -> (SampleSender, ChannelSource) {
    let (sender, receiver) = bounded(queue_depth);
    (sender, ChannelSource { receiver })
}

/// A sample source fed by a crossbeam channel of detection batches.
pub struct ChannelSource {
    receiver: Receiver<Vec<DetectedFace>>,
}

impl ChannelSource {
    /// Create a source with the default queue depth, returning the sender
    /// alongside it.
    pub fn with_default_depth() -> (SampleSender, ChannelSource) {
        sample_channel(DEFAULT_QUEUE_DEPTH)
    }
}

#[async_trait]
impl SampleSource for ChannelSource {
    async fn next_sample(&mut self) -> Result<Option<ExpressionSample>, DetectorError> {
        let mut latest: Option<Vec<DetectedFace>> = None;

        loop {
            match self.receiver.try_recv() {
                Ok(batch) => latest = Some(batch),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Anything already queued still counts for this tick.
                    if latest.is_none() {
                        return Err(DetectorError::Disconnected);
                    }
                    break;
                }
            }
        }

        Ok(latest
            .and_then(|batch| batch.into_iter().next())
            .map(|face| face.expressions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::types::EmotionLabel;

    fn face(label: EmotionLabel) -> DetectedFace {
        DetectedFace::new(ExpressionSample::new().with(label, 0.9))
    }

    #[tokio::test]
    async fn test_empty_queue_yields_none() {
        let (_sender, mut source) = sample_channel(4);
        assert_eq!(source.next_sample().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_drains_to_latest_batch() {
        let (sender, mut source) = sample_channel(4);
        sender.send(vec![face(EmotionLabel::Sad)]).unwrap();
        sender.send(vec![face(EmotionLabel::Happy)]).unwrap();

        let sample = source.next_sample().await.unwrap().unwrap();
        assert_eq!(sample.get(EmotionLabel::Happy), Some(0.9));

        // Queue drained: next tick sees nothing.
        assert_eq!(source.next_sample().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_batch_counts_as_no_face() {
        let (sender, mut source) = sample_channel(4);
        sender.send(vec![]).unwrap();
        assert_eq!(source.next_sample().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disconnected_sender_is_an_error() {
        let (sender, mut source) = sample_channel(4);
        drop(sender);
        assert!(matches!(
            source.next_sample().await,
            Err(DetectorError::Disconnected)
        ));
    }
}
