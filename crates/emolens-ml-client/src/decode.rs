//! Response normalization at the adapter boundary.
//!
//! Model backends are inconsistent about response shapes: the same
//! classifier may answer with a bare object, a one-element list of
//! objects, or differing field spellings (`emotion`/`label`/
//! `dominant_emotion`, `confidence`/`score`). Every recognized shape is
//! normalized here into a single result type before it enters the
//! pipeline; anything else fails with `UnrecognizedShape` rather than
//! being mis-parsed.

use serde_json::Value;

use emolens_models::{EmotionLabel, FaceEmotionResult, Sentiment};

use crate::error::{MlError, MlResult};

/// Unwrap the `[{...}]` list shape some backends use for single results.
fn unwrap_singleton(value: &Value) -> &Value {
    match value.as_array() {
        Some(items) if items.len() == 1 => &items[0],
        _ => value,
    }
}

fn field<'a>(obj: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| obj.get(name))
}

/// Decode an emotion prediction carrying a confidence.
pub fn decode_emotion_prediction(value: &Value) -> MlResult<FaceEmotionResult> {
    let obj = unwrap_singleton(value);

    let label = decode_emotion_label(obj)?;

    let confidence = field(obj, &["confidence", "score"])
        .and_then(Value::as_f64)
        .ok_or_else(|| MlError::unrecognized_shape(format!("missing confidence in {}", obj)))?;

    Ok(FaceEmotionResult::new(label, confidence.clamp(0.0, 1.0)))
}

/// Decode a bare emotion label (voice model responses carry no score).
pub fn decode_emotion_label(value: &Value) -> MlResult<EmotionLabel> {
    let obj = unwrap_singleton(value);

    let label_str = field(obj, &["emotion", "label", "dominant_emotion"])
        .and_then(Value::as_str)
        .ok_or_else(|| MlError::unrecognized_shape(format!("missing emotion label in {}", obj)))?;

    label_str
        .parse()
        .map_err(|_| MlError::unrecognized_shape(format!("label outside closed set: {}", label_str)))
}

/// Decode a transcription response.
pub fn decode_transcript(value: &Value) -> MlResult<String> {
    let obj = unwrap_singleton(value);

    if let Some(text) = obj.as_str() {
        return Ok(text.to_string());
    }

    field(obj, &["text", "transcript", "transcription"])
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MlError::unrecognized_shape(format!("missing transcript in {}", obj)))
}

/// Decode a sentiment response.
pub fn decode_sentiment(value: &Value) -> MlResult<Sentiment> {
    let obj = unwrap_singleton(value);

    let label = field(obj, &["label", "sentiment"])
        .and_then(Value::as_str)
        .ok_or_else(|| MlError::unrecognized_shape(format!("missing sentiment label in {}", obj)))?;

    let score = field(obj, &["score", "confidence"])
        .and_then(Value::as_f64)
        .ok_or_else(|| MlError::unrecognized_shape(format!("missing sentiment score in {}", obj)))?;

    Ok(Sentiment {
        label: label.to_string(),
        score: score.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_prediction_object_shape() {
        let result =
            decode_emotion_prediction(&json!({"emotion": "happy", "confidence": 0.91})).unwrap();
        assert_eq!(result.label, EmotionLabel::Happy);
        assert_eq!(result.confidence, 0.91);
    }

    #[test]
    fn test_decode_prediction_list_shape() {
        let result =
            decode_emotion_prediction(&json!([{"label": "sad", "score": 0.6}])).unwrap();
        assert_eq!(result.label, EmotionLabel::Sad);
        assert_eq!(result.confidence, 0.6);
    }

    #[test]
    fn test_decode_prediction_deepface_shape() {
        let result = decode_emotion_prediction(
            &json!([{"dominant_emotion": "angry", "confidence": 0.72}]),
        )
        .unwrap();
        assert_eq!(result.label, EmotionLabel::Angry);
    }

    #[test]
    fn test_confidence_clamped_to_unit_interval() {
        let result =
            decode_emotion_prediction(&json!({"emotion": "happy", "confidence": 1.7})).unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_decode_prediction_unrecognized_shapes() {
        for value in [
            json!("happy"),
            json!({"mood": "happy"}),
            json!({"emotion": "happy"}),
            json!([{"emotion": "happy", "confidence": 0.9}, {"emotion": "sad", "confidence": 0.1}]),
            json!(42),
        ] {
            assert!(matches!(
                decode_emotion_prediction(&value),
                Err(MlError::UnrecognizedShape(_))
            ));
        }
    }

    #[test]
    fn test_decode_label_rejects_open_set() {
        let err = decode_emotion_label(&json!({"emotion": "melancholic"})).unwrap_err();
        assert!(matches!(err, MlError::UnrecognizedShape(_)));
    }

    #[test]
    fn test_decode_transcript_shapes() {
        assert_eq!(decode_transcript(&json!({"text": "hi"})).unwrap(), "hi");
        assert_eq!(
            decode_transcript(&json!({"transcript": "hello"})).unwrap(),
            "hello"
        );
        assert_eq!(decode_transcript(&json!("plain")).unwrap(), "plain");
        assert_eq!(decode_transcript(&json!({"text": ""})).unwrap(), "");
        assert!(decode_transcript(&json!({"words": []})).is_err());
    }

    #[test]
    fn test_decode_sentiment_shapes() {
        let s = decode_sentiment(&json!([{"label": "POSITIVE", "score": 0.99}])).unwrap();
        assert_eq!(s.label, "POSITIVE");
        assert_eq!(s.score, 0.99);

        let s = decode_sentiment(&json!({"sentiment": "NEGATIVE", "confidence": 0.8})).unwrap();
        assert_eq!(s.label, "NEGATIVE");

        assert!(decode_sentiment(&json!({"label": "POSITIVE"})).is_err());
    }
}
