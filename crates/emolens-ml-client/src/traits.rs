//! Adapter traits for the external inference capabilities.
//!
//! The pipeline depends only on this surface, so any backend can be
//! swapped, mocked, or versioned by providing another implementation.
//! Supporting several backend API versions means several implementations
//! of the same trait selected at configuration time, never runtime
//! trial-and-error against an unknown signature.

use std::sync::Arc;

use async_trait::async_trait;

use emolens_models::{EmotionLabel, FaceEmotionResult, Sentiment};

use crate::client::{
    HttpFaceEmotionClassifier, HttpSentimentClassifier, HttpTranscriptionService,
    HttpVoiceEmotionClassifier, InferenceClient,
};
use crate::config::MlClientConfig;
use crate::error::MlResult;

/// Face emotion classification over a single frame image.
#[async_trait]
pub trait FaceEmotionClassifier: Send + Sync {
    /// Predict the dominant emotion in a JPEG-encoded frame.
    async fn predict(&self, image: &[u8]) -> MlResult<FaceEmotionResult>;
}

/// Emotion classification over a spoken audio track.
#[async_trait]
pub trait VoiceEmotionClassifier: Send + Sync {
    /// Predict the dominant emotion in a WAV-encoded audio track.
    async fn predict(&self, wav: &[u8]) -> MlResult<EmotionLabel>;
}

/// Speech-to-text over an audio track.
///
/// An empty or silent track is valid input and yields empty text.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, wav: &[u8]) -> MlResult<String>;
}

/// Sentiment classification over transcript text.
///
/// Undefined for empty text; callers must skip the call instead.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> MlResult<Sentiment>;
}

/// Immutable registry of inference adapters.
///
/// Constructed once at process startup and passed by reference into the
/// pipeline, replacing implicit process-global model state. Read-only
/// after construction, so it is safe to share across concurrent requests.
#[derive(Clone)]
pub struct AdapterRegistry {
    pub face: Arc<dyn FaceEmotionClassifier>,
    pub voice: Arc<dyn VoiceEmotionClassifier>,
    pub transcription: Arc<dyn TranscriptionService>,
    pub sentiment: Arc<dyn SentimentClassifier>,
}

impl AdapterRegistry {
    /// Build the HTTP-backed registry from client configuration.
    pub fn from_config(config: MlClientConfig) -> MlResult<Self> {
        let client = InferenceClient::new(config)?;
        Ok(Self {
            face: Arc::new(HttpFaceEmotionClassifier::new(client.clone())),
            voice: Arc::new(HttpVoiceEmotionClassifier::new(client.clone())),
            transcription: Arc::new(HttpTranscriptionService::new(client.clone())),
            sentiment: Arc::new(HttpSentimentClassifier::new(client)),
        })
    }

    /// Build the registry from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::from_config(MlClientConfig::from_env())
    }
}
