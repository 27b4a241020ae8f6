//! Pipeline orchestration.
//!
//! One `Pipeline` instance serves the whole process; each call owns a
//! fresh request workspace and walks the stage machine
//! `Received -> Ingesting -> Sampling -> Inferring -> Aggregating ->
//! Completed | Failed`. Fatal failures are limited to unsupported
//! formats, transcode failures, broken containers and zero extractable
//! frames; every other error degrades the affected modality instead of
//! aborting the request.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use emolens_media::{
    ingest, read_wav, sample_frames, validate_extension, AudioTrack, FrameSample,
    RequestWorkspace, VoiceFeatureExtractor,
};
use emolens_ml_client::{AdapterRegistry, MlError, MlResult};
use emolens_models::{
    AnalysisReport, AudioReport, EmotionLabel, FaceEmotionResult, VoiceAnalysisResult,
};

use crate::aggregate::aggregate;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Stages of one pipeline invocation, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Received,
    Ingesting,
    Sampling,
    Inferring,
    Aggregating,
    Completed,
    Failed,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Ingesting => "ingesting",
            Self::Sampling => "sampling",
            Self::Inferring => "inferring",
            Self::Aggregating => "aggregating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Voice-branch outcome before fusion.
#[derive(Debug, Default)]
struct VoiceOutcome {
    analysis: VoiceAnalysisResult,
    emotion: Option<EmotionLabel>,
}

/// The affect analysis pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    registry: AdapterRegistry,
    extractor: VoiceFeatureExtractor,
}

impl Pipeline {
    /// Create a pipeline over an adapter registry.
    pub fn new(config: PipelineConfig, registry: AdapterRegistry) -> Self {
        Self {
            config,
            registry,
            extractor: VoiceFeatureExtractor::default(),
        }
    }

    /// Analyze an uploaded video clip into an affect report.
    ///
    /// The request workspace is removed on every exit path; if the
    /// calling task is cancelled mid-flight, the workspace's `Drop`
    /// still cleans up.
    pub async fn analyze_video(
        &self,
        video_bytes: &[u8],
        extension: &str,
    ) -> PipelineResult<AnalysisReport> {
        // Fail fast on client input errors before allocating anything.
        validate_extension(extension)?;
        if video_bytes.is_empty() {
            return Err(PipelineError::EmptyUpload);
        }

        let workspace = RequestWorkspace::create(&self.config.temp_dir).await?;
        let token = workspace.token().clone();
        debug!(token = %token, stage = Stage::Received.as_str(), "Video analysis request");

        let result = self.run_video(&workspace, video_bytes, extension).await;

        // Cleanup runs exactly once regardless of outcome. A failed
        // deletion is logged inside cleanup() and must not replace an
        // already-computed result.
        if workspace.cleanup().await.is_err() {
            warn!(token = %token, "Workspace cleanup failed, continuing with computed result");
        }

        match &result {
            Ok(report) => info!(
                token = %token,
                stage = Stage::Completed.as_str(),
                face_emotion = %report.face_emotion,
                voice_emotion = %report.voice_emotion,
                "Analysis complete"
            ),
            Err(e) => warn!(token = %token, stage = Stage::Failed.as_str(), error = %e, "Analysis failed"),
        }

        result
    }

    /// Apply the per-call adapter timeout to an inference future.
    async fn bounded<T>(
        &self,
        future: impl std::future::Future<Output = MlResult<T>>,
    ) -> MlResult<T> {
        match tokio::time::timeout(self.config.adapter_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(MlError::Timeout(self.config.adapter_timeout.as_secs())),
        }
    }

    async fn run_video(
        &self,
        workspace: &RequestWorkspace,
        video_bytes: &[u8],
        extension: &str,
    ) -> PipelineResult<AnalysisReport> {
        debug!(token = %workspace.token(), stage = Stage::Ingesting.as_str(), "Ingesting upload");
        let media = ingest(
            workspace,
            video_bytes,
            extension,
            self.config.ffmpeg_timeout_secs,
        )
        .await?;

        debug!(token = %workspace.token(), stage = Stage::Sampling.as_str(), "Sampling frames");
        let frames = sample_frames(
            workspace,
            &media.video_path,
            &media.info.timing(),
            self.config.cadence_fps,
            self.config.ffmpeg_timeout_secs,
        )
        .await?;

        debug!(
            token = %workspace.token(),
            stage = Stage::Inferring.as_str(),
            frames = frames.len(),
            "Running face and voice inference"
        );
        let (face_results, voice) = tokio::join!(
            self.face_branch(&frames),
            self.voice_branch(&media.audio, media.audio_path.as_deref()),
        );

        debug!(token = %workspace.token(), stage = Stage::Aggregating.as_str(), "Fusing results");
        Ok(aggregate(&face_results, voice.analysis, voice.emotion))
    }

    /// Classify all sampled frames with bounded concurrency.
    ///
    /// The stream is `buffered`, not `buffer_unordered`: completion order
    /// may vary but results come back in frame order, which the
    /// aggregator's first-seen tie-break depends on. A frame whose read,
    /// classification or timeout fails is dropped from the batch.
    async fn face_branch(&self, frames: &[FrameSample]) -> Vec<FaceEmotionResult> {
        let face = Arc::clone(&self.registry.face);

        // The stream closure takes owned data instead of `&FrameSample`;
        // a reference argument here trips rustc's higher-ranked `Send`
        // inference for the calling handler (rust-lang/rust#102211).
        let jobs: Vec<(usize, std::path::PathBuf)> = frames
            .iter()
            .map(|frame| (frame.index, frame.path.clone()))
            .collect();

        let results: Vec<Option<FaceEmotionResult>> = stream::iter(jobs)
            .map(|(index, path)| {
                let face = Arc::clone(&face);
                async move {
                    let image = match tokio::fs::read(&path).await {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(index, error = %e, "Failed to read frame, skipping");
                            return None;
                        }
                    };
                    match self.bounded(face.predict(&image)).await {
                        Ok(result) => Some(result),
                        Err(e) => {
                            warn!(index, error = %e, "Frame classification failed, skipping");
                            None
                        }
                    }
                }
            })
            .buffered(self.config.frame_concurrency.max(1))
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }

    /// Run prosody extraction, transcription, sentiment and voice-emotion
    /// classification; every failure degrades its own field only.
    async fn voice_branch(&self, audio: &AudioTrack, wav_path: Option<&Path>) -> VoiceOutcome {
        if audio.is_empty() {
            debug!("No audio stream, voice branch degrades to defaults");
            return VoiceOutcome::default();
        }

        let features = {
            let extractor = self.extractor.clone();
            let track = audio.clone();
            tokio::task::spawn_blocking(move || extractor.extract(&track))
                .await
                .unwrap_or_default()
        };

        let wav_bytes = match wav_path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Failed to read extracted WAV, voice models skipped");
                    return VoiceOutcome {
                        analysis: VoiceAnalysisResult {
                            avg_pitch_hz: features.avg_pitch_hz,
                            min_pitch_hz: features.min_pitch_hz,
                            max_pitch_hz: features.max_pitch_hz,
                            avg_intensity: features.avg_intensity,
                            ..Default::default()
                        },
                        emotion: None,
                    };
                }
            },
            None => return VoiceOutcome::default(),
        };

        let transcript_future = async {
            match self
                .bounded(self.registry.transcription.transcribe(&wav_bytes))
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Transcription failed, degrading to empty transcript");
                    String::new()
                }
            }
        };

        let emotion_future = async {
            match self.bounded(self.registry.voice.predict(&wav_bytes)).await {
                Ok(label) => Some(label),
                Err(e) => {
                    warn!(error = %e, "Voice emotion classification failed, degrading to unknown");
                    None
                }
            }
        };

        let (transcript, emotion) = tokio::join!(transcript_future, emotion_future);

        // Sentiment is undefined for empty text; skip the call entirely.
        let sentiment = if transcript.trim().is_empty() {
            None
        } else {
            match self.bounded(self.registry.sentiment.classify(&transcript)).await {
                Ok(sentiment) => Some(sentiment),
                Err(e) => {
                    warn!(error = %e, "Sentiment classification failed, degrading to absent");
                    None
                }
            }
        };

        VoiceOutcome {
            analysis: VoiceAnalysisResult {
                avg_pitch_hz: features.avg_pitch_hz,
                min_pitch_hz: features.min_pitch_hz,
                max_pitch_hz: features.max_pitch_hz,
                avg_intensity: features.avg_intensity,
                transcript,
                sentiment,
            },
            emotion,
        }
    }

    /// Analyze an uploaded WAV file: the voice chain without the
    /// video/frame branch.
    pub async fn analyze_audio(&self, wav_bytes: &[u8]) -> PipelineResult<AudioReport> {
        if wav_bytes.is_empty() {
            return Err(PipelineError::EmptyUpload);
        }

        let workspace = RequestWorkspace::create(&self.config.temp_dir).await?;
        let token = workspace.token().clone();
        debug!(token = %token, "Audio analysis request");

        let result = self.run_audio(&workspace, wav_bytes).await;

        if workspace.cleanup().await.is_err() {
            warn!(token = %token, "Workspace cleanup failed, continuing with computed result");
        }

        result
    }

    async fn run_audio(
        &self,
        workspace: &RequestWorkspace,
        wav_bytes: &[u8],
    ) -> PipelineResult<AudioReport> {
        let wav_path = workspace.path_for("audio.wav");
        tokio::fs::write(&wav_path, wav_bytes).await?;

        let track = read_wav(&wav_path)?;
        let outcome = self.voice_branch(&track, Some(&wav_path)).await;

        Ok(AudioReport::from(outcome.analysis))
    }
}
