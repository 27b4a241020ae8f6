//! FFmpeg CLI wrapper and signal processing for the analysis pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeout enforcement
//! - Container probing and ingestion (transcode + audio extraction)
//! - Deterministic frame sampling at a fixed temporal cadence
//! - WAV decoding and voice prosody feature extraction
//! - Request-scoped temporary workspaces with guaranteed cleanup

pub mod command;
pub mod error;
pub mod frames;
pub mod ingest;
pub mod probe;
pub mod voice;
pub mod wav;
pub mod workspace;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::{sample_frames, sample_timestamps, FrameSample, DEFAULT_CADENCE_FPS};
pub use ingest::{ingest, validate_extension, AudioTrack, IngestedMedia, SUPPORTED_EXTENSIONS};
pub use probe::{probe_video, VideoInfo, VideoTiming};
pub use voice::{VoiceFeatureExtractor, VoiceFeatures};
pub use wav::read_wav;
pub use workspace::RequestWorkspace;
