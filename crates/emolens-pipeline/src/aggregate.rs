//! Fusion of per-frame and per-modality results into one report.

use emolens_models::{round2, AnalysisReport, EmotionLabel, FaceEmotionResult, VoiceAnalysisResult};

/// Fuse per-frame face results and the voice analysis into a report.
///
/// Face emotion is the mode of per-frame labels; ties break toward the
/// label seen first in frame order, so the reduction over any frame
/// ordering of the same multiset is deterministic given the original
/// sequence. Confidence is averaged across ALL classified frames, not
/// only those voting for the winner: the winning label and a noisy
/// minority both came out of the same classifier, and the report's
/// confidence describes the whole batch.
pub fn aggregate(
    face_results: &[FaceEmotionResult],
    voice: VoiceAnalysisResult,
    voice_emotion: Option<EmotionLabel>,
) -> AnalysisReport {
    let face_emotion = mode_first_seen(face_results.iter().map(|r| r.label))
        .map(|label| label.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let avg_confidence = if face_results.is_empty() {
        0.0
    } else {
        let sum: f64 = face_results.iter().map(|r| r.confidence).sum();
        round2(sum / face_results.len() as f64)
    };

    AnalysisReport {
        face_emotion,
        avg_confidence,
        voice_emotion: voice_emotion
            .map(|label| label.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        transcription: voice.transcript,
    }
}

/// Most frequent label, ties broken by first appearance in the sequence.
fn mode_first_seen(labels: impl Iterator<Item = EmotionLabel>) -> Option<EmotionLabel> {
    // Insertion-ordered counts; the label set is 8 wide so linear scans
    // beat a map here.
    let mut counts: Vec<(EmotionLabel, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    // counts is in first-seen order; only a strictly greater count may
    // displace the current winner, which is exactly the tie-break rule.
    let mut best: Option<(EmotionLabel, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emolens_models::Sentiment;

    fn frame(label: EmotionLabel, confidence: f64) -> FaceEmotionResult {
        FaceEmotionResult::new(label, confidence)
    }

    fn voice_with_transcript(transcript: &str) -> VoiceAnalysisResult {
        VoiceAnalysisResult {
            transcript: transcript.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_wins_by_frequency() {
        let frames = vec![
            frame(EmotionLabel::Sad, 0.5),
            frame(EmotionLabel::Happy, 0.9),
            frame(EmotionLabel::Happy, 0.8),
            frame(EmotionLabel::Happy, 0.7),
            frame(EmotionLabel::Sad, 0.6),
        ];
        let report = aggregate(&frames, VoiceAnalysisResult::default(), None);
        assert_eq!(report.face_emotion, "happy");
    }

    #[test]
    fn test_tie_breaks_to_first_seen() {
        // A, B, A, B is a 2-2 tie; first-seen wins
        let frames = vec![
            frame(EmotionLabel::Angry, 0.5),
            frame(EmotionLabel::Calm, 0.5),
            frame(EmotionLabel::Angry, 0.5),
            frame(EmotionLabel::Calm, 0.5),
        ];
        let report = aggregate(&frames, VoiceAnalysisResult::default(), None);
        assert_eq!(report.face_emotion, "angry");
    }

    #[test]
    fn test_winner_frequency_is_maximal() {
        let frames = vec![
            frame(EmotionLabel::Neutral, 0.4),
            frame(EmotionLabel::Surprise, 0.4),
            frame(EmotionLabel::Surprise, 0.4),
            frame(EmotionLabel::Neutral, 0.4),
            frame(EmotionLabel::Neutral, 0.4),
        ];
        let report = aggregate(&frames, VoiceAnalysisResult::default(), None);
        let winner: EmotionLabel = report.face_emotion.parse().unwrap();
        let winner_count = frames.iter().filter(|f| f.label == winner).count();
        for other in frames.iter().map(|f| f.label) {
            let count = frames.iter().filter(|f| f.label == other).count();
            assert!(winner_count >= count);
        }
    }

    #[test]
    fn test_confidence_averaged_over_all_frames() {
        let frames = vec![
            frame(EmotionLabel::Happy, 0.9),
            frame(EmotionLabel::Happy, 0.7),
            frame(EmotionLabel::Sad, 0.8),
        ];
        let report = aggregate(&frames, VoiceAnalysisResult::default(), None);
        assert_eq!(report.avg_confidence, 0.8);
    }

    #[test]
    fn test_empty_frames_degrade_to_unknown() {
        let report = aggregate(&[], voice_with_transcript("still here"), None);
        assert_eq!(report.face_emotion, "unknown");
        assert_eq!(report.avg_confidence, 0.0);
        assert_eq!(report.transcription, "still here");
    }

    #[test]
    fn test_voice_emotion_defaults_to_unknown() {
        let report = aggregate(&[], VoiceAnalysisResult::default(), None);
        assert_eq!(report.voice_emotion, "unknown");

        let report = aggregate(&[], VoiceAnalysisResult::default(), Some(EmotionLabel::Happy));
        assert_eq!(report.voice_emotion, "happy");
    }

    #[test]
    fn test_voice_fields_pass_through() {
        let voice = VoiceAnalysisResult {
            avg_pitch_hz: 215.0,
            min_pitch_hz: 110.0,
            max_pitch_hz: 340.0,
            avg_intensity: 0.04,
            transcript: "I feel great today".to_string(),
            sentiment: Some(Sentiment {
                label: "POSITIVE".to_string(),
                score: 0.99,
            }),
        };
        let report = aggregate(
            &[frame(EmotionLabel::Happy, 0.85)],
            voice,
            Some(EmotionLabel::Happy),
        );
        assert_eq!(report.transcription, "I feel great today");
        assert_eq!(report.voice_emotion, "happy");
    }
}
