//! Inference result and report types.

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionLabel;

/// Face emotion classification for a single sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceEmotionResult {
    /// Predicted label
    pub label: EmotionLabel,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
}

impl FaceEmotionResult {
    pub fn new(label: EmotionLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Sentiment classification of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Sentiment label (e.g. "POSITIVE"/"NEGATIVE")
    pub label: String,
    /// Classifier score in [0, 1]
    pub score: f64,
}

/// Fused voice-side analysis for one request.
///
/// Pitch fields are 0.0 (never NaN) when no voiced frames were detected.
/// The transcript is empty when the audio track is silent, absent, or the
/// transcription service failed; sentiment is `None` whenever the
/// transcript is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VoiceAnalysisResult {
    pub avg_pitch_hz: f64,
    pub min_pitch_hz: f64,
    /// Robust maximum (95th percentile) of voiced pitch estimates
    pub max_pitch_hz: f64,
    pub avg_intensity: f64,
    pub transcript: String,
    pub sentiment: Option<Sentiment>,
}

/// The final affect report for a video analysis request.
///
/// Serialized field names match the public `/analyze` response contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Winning face emotion, or "unknown" if no frame was classified
    pub face_emotion: String,
    /// Mean confidence across all classified frames, 2 decimals
    pub avg_confidence: f64,
    /// Voice emotion, or "unknown" if no voice-model output was obtained
    pub voice_emotion: String,
    /// Transcript text, possibly empty
    pub transcription: String,
}

/// Response for the audio-only `/analyze-audio` entry point.
///
/// Field names match the original voice-analysis response contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioReport {
    pub average_pitch: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
    pub average_intensity: f64,
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl From<VoiceAnalysisResult> for AudioReport {
    fn from(voice: VoiceAnalysisResult) -> Self {
        Self {
            average_pitch: round2(voice.avg_pitch_hz),
            min_pitch: round2(voice.min_pitch_hz),
            max_pitch: round2(voice.max_pitch_hz),
            average_intensity: round2(voice.avg_intensity),
            transcript: voice.transcript,
            sentiment: voice.sentiment,
        }
    }
}

/// Round to two decimals for report presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.79333), 0.79);
        assert_eq!(round2(0.795), 0.8);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_audio_report_rounds_presentation_fields() {
        let voice = VoiceAnalysisResult {
            avg_pitch_hz: 214.5678,
            min_pitch_hz: 100.001,
            max_pitch_hz: 401.239,
            avg_intensity: 0.04567,
            transcript: "hello".to_string(),
            sentiment: Some(Sentiment {
                label: "POSITIVE".to_string(),
                score: 0.98,
            }),
        };

        let report = AudioReport::from(voice);
        assert_eq!(report.average_pitch, 214.57);
        assert_eq!(report.min_pitch, 100.0);
        assert_eq!(report.max_pitch, 401.24);
        assert_eq!(report.average_intensity, 0.05);
    }

    #[test]
    fn test_audio_report_omits_absent_sentiment() {
        let report = AudioReport::from(VoiceAnalysisResult::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("sentiment").is_none());
    }

    #[test]
    fn test_analysis_report_json_contract() {
        let report = AnalysisReport {
            face_emotion: "happy".to_string(),
            avg_confidence: 0.79,
            voice_emotion: "happy".to_string(),
            transcription: "I feel great today".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["face_emotion"], "happy");
        assert_eq!(json["avg_confidence"], 0.79);
        assert_eq!(json["transcription"], "I feel great today");
    }
}
