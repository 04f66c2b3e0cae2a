//! Recommendation hand-off for stable emotions.
//!
//! Once per completed voting window the scheduler invokes the configured
//! trigger with the winning label. The hand-off is fire-and-forget: the
//! return value only feeds logging, and a failing trigger never interrupts
//! the sampling loop.

use crate::core::voting::StableEmotion;
use crate::detector::types::EmotionLabel;
use tracing::info;

/// Downstream recommendation failures; caught and logged by the scheduler.
#[derive(Debug)]
pub struct RecommendError(pub String);

impl std::fmt::Display for RecommendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "recommendation error: {}", self.0)
    }
}

impl std::error::Error for RecommendError {}

/// Consumer of stable-emotion events.
pub trait RecommendationTrigger: Send + Sync {
    fn trigger(&self, stable: &StableEmotion) -> Result<(), RecommendError>;
}

/// Maps each stable emotion to a named playlist and logs the selection.
pub struct PlaylistRecommender;

impl PlaylistRecommender {
    /// Playlist picked for a given emotion.
    pub fn playlist_for(label: EmotionLabel) -> &'static str {
        match label {
            EmotionLabel::Neutral => "Everyday Mix",
            EmotionLabel::Happy => "Upbeat Hits",
            EmotionLabel::Sad => "Mellow Acoustics",
            EmotionLabel::Angry => "Heavy Rotation",
            EmotionLabel::Fearful => "Calm Waters",
            EmotionLabel::Disgusted => "Palate Cleanser",
            EmotionLabel::Surprised => "Discover Something New",
        }
    }
}

impl RecommendationTrigger for PlaylistRecommender {
    fn trigger(&self, stable: &StableEmotion) -> Result<(), RecommendError> {
        info!(
            emotion = %stable.label,
            playlist = Self::playlist_for(stable.label),
            votes = stable.votes,
            "recommending playlist"
        );
        Ok(())
    }
}

/// No-op trigger for pipelines without a recommendation consumer.
pub struct NullRecommender;

impl RecommendationTrigger for NullRecommender {
    fn trigger(&self, _stable: &StableEmotion) -> Result<(), RecommendError> {
        Ok(())
    }
}
