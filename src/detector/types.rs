//! Detection-boundary types for the emosense agent.
//!
//! The face/expression model is an external collaborator; these types describe
//! what crosses that boundary each tick: detected faces carrying an ordered
//! label→probability mapping.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the model's fixed expression classes.
///
/// The set is closed at compile time; the declaration order is the model's
/// canonical output order and doubles as the default iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl EmotionLabel {
    /// All labels in canonical model order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Surprised,
    ];

    /// Lowercase wire name for this label.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgusted => "disgusted",
            EmotionLabel::Surprised => "surprised",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single tick's expression probabilities, in first-seen order.
///
/// Probabilities are expected in [0, 1] but need not sum to 1 (model
/// artifact). Entry order is semantically significant: arg-max and majority
/// tie-breaks both resolve to the earliest entry, so the mapping is stored as
/// an insertion-ordered sequence rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionSample {
    entries: Vec<(EmotionLabel, f64)>,
}

impl ExpressionSample {
    /// Create an empty sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probability for a label.
    ///
    /// A label already present is updated in place and keeps its position;
    /// a new label is appended.
    pub fn set(&mut self, label: EmotionLabel, probability: f64) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, p)) => *p = probability,
            None => self.entries.push((label, probability)),
        }
    }

    /// Builder-style [`set`](Self::set), handy in tests and scripts.
    pub fn with(mut self, label: EmotionLabel, probability: f64) -> Self {
        self.set(label, probability);
        self
    }

    /// Look up the probability for a label.
    pub fn get(&self, label: EmotionLabel) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, p)| p)
    }

    /// Entries in first-seen order.
    pub fn entries(&self) -> &[(EmotionLabel, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Samples cross the wire as a plain JSON object ({"happy": 0.92, ...}), which
// is what browser-side detectors emit. Hand-written serde keeps document
// order intact; a derived map type would sort the keys.
impl Serialize for ExpressionSample {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, probability) in &self.entries {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExpressionSample {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SampleVisitor;

        impl<'de> Visitor<'de> for SampleVisitor {
            type Value = ExpressionSample;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of emotion label to probability")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut sample = ExpressionSample::new();
                while let Some((label, probability)) = access.next_entry::<EmotionLabel, f64>()? {
                    sample.set(label, probability);
                }
                Ok(sample)
            }
        }

        deserializer.deserialize_map(SampleVisitor)
    }
}

/// One detection result from the external model.
///
/// The aggregation core only ever consumes the first face of a batch;
/// additional faces are carried for display collaborators and dropped by the
/// sample-source adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedFace {
    /// Expression probabilities for this face.
    pub expressions: ExpressionSample,
    /// Detector confidence for the face box, when the model reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl DetectedFace {
    pub fn new(expressions: ExpressionSample) -> Self {
        Self {
            expressions,
            score: None,
        }
    }
}

/// Per-sample validation failures, recovered locally by skipping the tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// The sample carried no entries at all.
    Empty,
    /// A probability was negative or not finite.
    InvalidProbability { label: EmotionLabel, value: f64 },
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Empty => write!(f, "expression sample is empty"),
            SampleError::InvalidProbability { label, value } => {
                write!(f, "invalid probability {value} for label '{label}'")
            }
        }
    }
}

impl std::error::Error for SampleError {}

/// Errors from the detection collaborator.
///
/// `DeviceUnavailable` and `ModelLoad` are startup failures and abort
/// initialization; `Detection` and `Disconnected` occur per tick and are
/// contained by the scheduler.
#[derive(Debug)]
pub enum DetectorError {
    /// Camera/capture device denied or missing. Fatal at startup.
    DeviceUnavailable(String),
    /// Detection assets failed to load. Fatal at startup.
    ModelLoad(String),
    /// A single detection call failed.
    Detection(String),
    /// The upstream feed is gone and will not produce further samples.
    Disconnected,
}

impl std::fmt::Display for DetectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorError::DeviceUnavailable(msg) => write!(f, "capture device unavailable: {msg}"),
            DetectorError::ModelLoad(msg) => write!(f, "detection model failed to load: {msg}"),
            DetectorError::Detection(msg) => write!(f, "detection failed: {msg}"),
            DetectorError::Disconnected => write!(f, "sample feed disconnected"),
        }
    }
}

impl std::error::Error for DetectorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_preserves_first_seen_order() {
        let mut sample = ExpressionSample::new();
        sample.set(EmotionLabel::Happy, 0.5);
        sample.set(EmotionLabel::Sad, 0.3);
        sample.set(EmotionLabel::Happy, 0.7); // update, not reorder

        let labels: Vec<EmotionLabel> = sample.entries().iter().map(|&(l, _)| l).collect();
        assert_eq!(labels, vec![EmotionLabel::Happy, EmotionLabel::Sad]);
        assert_eq!(sample.get(EmotionLabel::Happy), Some(0.7));
    }

    #[test]
    fn test_sample_json_round_trip_keeps_order() {
        let sample = ExpressionSample::new()
            .with(EmotionLabel::Surprised, 0.1)
            .with(EmotionLabel::Neutral, 0.8);

        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"surprised":0.1,"neutral":0.8}"#);

        let back: ExpressionSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_detected_face_from_wire() {
        let json = r#"{"expressions":{"happy":0.9,"neutral":0.05}}"#;
        let face: DetectedFace = serde_json::from_str(json).unwrap();
        assert_eq!(face.expressions.get(EmotionLabel::Happy), Some(0.9));
        assert!(face.score.is_none());
    }

    #[test]
    fn test_label_wire_names() {
        assert_eq!(EmotionLabel::Disgusted.as_str(), "disgusted");
        assert_eq!(EmotionLabel::ALL.len(), 7);
    }
}
