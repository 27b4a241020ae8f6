//! The closed emotion label set.
//!
//! Both the face classifier and the voice classifier were trained on the
//! same eight RAVDESS-style labels, so a single enum covers both
//! modalities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An emotion label produced by the face or voice classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Neutral,
    Calm,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgust,
    Surprise,
}

/// All labels in training order.
pub const EMOTION_LABELS: [EmotionLabel; 8] = [
    EmotionLabel::Neutral,
    EmotionLabel::Calm,
    EmotionLabel::Happy,
    EmotionLabel::Sad,
    EmotionLabel::Angry,
    EmotionLabel::Fearful,
    EmotionLabel::Disgust,
    EmotionLabel::Surprise,
];

/// Error returned when a label string is not part of the closed set.
#[derive(Debug, Clone, Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownLabelError(pub String);

impl EmotionLabel {
    /// Returns the label as a lowercase string for display and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Calm => "calm",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fearful => "fearful",
            Self::Disgust => "disgust",
            Self::Surprise => "surprise",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = UnknownLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "calm" => Ok(Self::Calm),
            "happy" | "happiness" => Ok(Self::Happy),
            "sad" | "sadness" => Ok(Self::Sad),
            "angry" | "anger" => Ok(Self::Angry),
            "fearful" | "fear" => Ok(Self::Fearful),
            "disgust" | "disgusted" => Ok(Self::Disgust),
            "surprise" | "surprised" => Ok(Self::Surprise),
            other => Err(UnknownLabelError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_labels() {
        for label in EMOTION_LABELS {
            let parsed: EmotionLabel = label.as_str().parse().unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn test_backend_alias_spellings() {
        assert_eq!("Happiness".parse::<EmotionLabel>().unwrap(), EmotionLabel::Happy);
        assert_eq!("ANGER".parse::<EmotionLabel>().unwrap(), EmotionLabel::Angry);
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!("confused".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Fearful).unwrap();
        assert_eq!(json, "\"fearful\"");
    }
}
