//! HTTP clients for the inference service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use emolens_models::{EmotionLabel, FaceEmotionResult, Sentiment};

use crate::config::MlClientConfig;
use crate::decode::{
    decode_emotion_label, decode_emotion_prediction, decode_sentiment, decode_transcript,
};
use crate::error::{MlError, MlResult};
use crate::traits::{
    FaceEmotionClassifier, SentimentClassifier, TranscriptionService, VoiceEmotionClassifier,
};

/// Shared HTTP plumbing for the inference endpoints.
#[derive(Clone)]
pub struct InferenceClient {
    http: Client,
    config: MlClientConfig,
}

impl InferenceClient {
    /// Create a new client with the configured timeout baked in.
    pub fn new(config: MlClientConfig) -> MlResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MlError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> MlResult<Self> {
        Self::new(MlClientConfig::from_env())
    }

    /// Check if the inference service is healthy.
    pub async fn health_check(&self) -> MlResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Inference service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Inference service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// POST a binary payload and return the decoded JSON body.
    async fn post_binary(&self, path: &str, body: &[u8], content_type: &str) -> MlResult<Value> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(url = %url, bytes = body.len(), "Sending inference request");

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(body.to_vec())
                    .send()
                    .await
                    .map_err(MlError::Network)
                    .and_then(check_status)
            })
            .await?;

        Ok(response.json().await?)
    }

    /// POST a JSON payload and return the decoded JSON body.
    async fn post_json(&self, path: &str, body: &Value) -> MlResult<Value> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!(url = %url, "Sending inference request");

        let response = self
            .with_retry(|| async {
                self.http
                    .post(&url)
                    .json(body)
                    .send()
                    .await
                    .map_err(MlError::Network)
                    .and_then(check_status)
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Execute with bounded retry and exponential backoff.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> MlResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = MlResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Inference request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MlError::RequestFailed("Unknown error".to_string())))
    }
}

/// Map non-success statuses onto the error taxonomy.
fn check_status(response: reqwest::Response) -> MlResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status.is_server_error() {
        Err(MlError::ServiceUnavailable(format!(
            "service returned {}",
            status
        )))
    } else {
        Err(MlError::RequestFailed(format!("service returned {}", status)))
    }
}

/// HTTP-backed face emotion classifier.
pub struct HttpFaceEmotionClassifier {
    client: InferenceClient,
}

impl HttpFaceEmotionClassifier {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FaceEmotionClassifier for HttpFaceEmotionClassifier {
    async fn predict(&self, image: &[u8]) -> MlResult<FaceEmotionResult> {
        let body = self
            .client
            .post_binary("/face-emotion", image, "image/jpeg")
            .await?;
        decode_emotion_prediction(&body)
    }
}

/// HTTP-backed voice emotion classifier.
pub struct HttpVoiceEmotionClassifier {
    client: InferenceClient,
}

impl HttpVoiceEmotionClassifier {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VoiceEmotionClassifier for HttpVoiceEmotionClassifier {
    async fn predict(&self, wav: &[u8]) -> MlResult<EmotionLabel> {
        let body = self
            .client
            .post_binary("/voice-emotion", wav, "audio/wav")
            .await?;
        decode_emotion_label(&body)
    }
}

/// HTTP-backed speech-to-text service.
pub struct HttpTranscriptionService {
    client: InferenceClient,
}

impl HttpTranscriptionService {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptionService for HttpTranscriptionService {
    async fn transcribe(&self, wav: &[u8]) -> MlResult<String> {
        let body = self
            .client
            .post_binary("/transcribe", wav, "audio/wav")
            .await?;
        decode_transcript(&body)
    }
}

/// HTTP-backed sentiment classifier.
pub struct HttpSentimentClassifier {
    client: InferenceClient,
}

impl HttpSentimentClassifier {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SentimentClassifier for HttpSentimentClassifier {
    async fn classify(&self, text: &str) -> MlResult<Sentiment> {
        let body = self
            .client
            .post_json("/sentiment", &serde_json::json!({ "text": text }))
            .await?;
        decode_sentiment(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> MlClientConfig {
        MlClientConfig {
            base_url,
            timeout: Duration::from_secs(5),
            max_retries: 1,
        }
    }

    #[tokio::test]
    async fn test_face_predict_decodes_object_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/face-emotion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"emotion": "happy", "confidence": 0.93}),
            ))
            .mount(&server)
            .await;

        let client = InferenceClient::new(test_config(server.uri())).unwrap();
        let face = HttpFaceEmotionClassifier::new(client);

        let result = face.predict(b"jpeg bytes").await.unwrap();
        assert_eq!(result.label, EmotionLabel::Happy);
        assert_eq!(result.confidence, 0.93);
    }

    #[tokio::test]
    async fn test_sentiment_decodes_pipeline_list_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sentiment"))
            .and(body_json(serde_json::json!({"text": "I feel great today"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!([{"label": "POSITIVE", "score": 0.998}]),
            ))
            .mount(&server)
            .await;

        let client = InferenceClient::new(test_config(server.uri())).unwrap();
        let sentiment = HttpSentimentClassifier::new(client);

        let result = sentiment.classify("I feel great today").await.unwrap();
        assert_eq!(result.label, "POSITIVE");
    }

    #[tokio::test]
    async fn test_server_error_retried_then_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2) // initial attempt + one retry
            .mount(&server)
            .await;

        let client = InferenceClient::new(test_config(server.uri())).unwrap();
        let stt = HttpTranscriptionService::new(client);

        let err = stt.transcribe(b"wav").await.unwrap_err();
        assert!(matches!(err, MlError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/voice-emotion"))
            .respond_with(ResponseTemplate::new(422))
            .expect(1)
            .mount(&server)
            .await;

        let client = InferenceClient::new(test_config(server.uri())).unwrap();
        let voice = HttpVoiceEmotionClassifier::new(client);

        let err = voice.predict(b"wav").await.unwrap_err();
        assert!(matches!(err, MlError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_unrecognized_shape_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/face-emotion"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"mood": "great"})),
            )
            .mount(&server)
            .await;

        let client = InferenceClient::new(test_config(server.uri())).unwrap();
        let face = HttpFaceEmotionClassifier::new(client);

        let err = face.predict(b"jpeg").await.unwrap_err();
        assert!(matches!(err, MlError::UnrecognizedShape(_)));
    }
}
