//! Media ingestion: container normalization and audio extraction.
//!
//! Demuxes an uploaded video into a canonical H.264/AAC MP4 (transcoding
//! when the container is not natively decodable) and a mono 22050 Hz PCM
//! WAV audio track. All outputs land inside the request workspace.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};
use crate::wav::read_wav;
use crate::workspace::RequestWorkspace;

/// Extensions accepted for upload, checked before any disk work.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["mp4", "mov", "mkv", "avi"];

/// Sample rate for the canonical WAV track. Matches the rate the voice
/// feature extractor and downstream models were tuned against.
pub const AUDIO_SAMPLE_RATE: u32 = 22050;

/// Decoded audio track extracted from a video.
///
/// `samples` is empty when the source carries no audio stream; that is a
/// valid state, not an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioTrack {
    /// Mono waveform, normalized to [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioTrack {
    /// True when the source had no audio stream.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Track duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Result of ingesting an upload.
#[derive(Debug)]
pub struct IngestedMedia {
    /// Canonical MP4 path inside the workspace
    pub video_path: PathBuf,
    /// Probed video information
    pub info: VideoInfo,
    /// Decoded audio track (empty if the source has no audio stream)
    pub audio: AudioTrack,
    /// Path of the extracted WAV, if an audio stream existed
    pub audio_path: Option<PathBuf>,
}

/// Validate and normalize a declared file extension.
///
/// Fails fast with `UnsupportedFormat` before any resource allocation.
pub fn validate_extension(extension: &str) -> MediaResult<String> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(MediaError::UnsupportedFormat(extension.to_string()))
    }
}

/// Ingest an uploaded video into the workspace.
///
/// Writes the upload, transcodes non-MP4 containers to H.264/AAC MP4,
/// probes timing metadata and extracts the audio track as mono PCM WAV.
pub async fn ingest(
    workspace: &RequestWorkspace,
    video_bytes: &[u8],
    extension: &str,
    ffmpeg_timeout_secs: u64,
) -> MediaResult<IngestedMedia> {
    let ext = validate_extension(extension)?;

    if video_bytes.is_empty() {
        return Err(MediaError::invalid_video("Empty upload"));
    }

    let source_path = workspace.path_for(format!("source.{}", ext));
    tokio::fs::write(&source_path, video_bytes).await?;

    let video_path = if ext == "mp4" {
        source_path.clone()
    } else {
        transcode_to_mp4(workspace, &source_path, ffmpeg_timeout_secs).await?
    };

    let info = probe_video(&video_path).await?;
    debug!(
        duration = info.duration,
        fps = info.fps,
        frames = info.frame_count,
        has_audio = info.has_audio,
        "Probed ingested video"
    );

    let (audio, audio_path) = if info.has_audio {
        let wav_path = extract_audio(workspace, &video_path, ffmpeg_timeout_secs).await?;
        let track = read_wav(&wav_path)?;
        (track, Some(wav_path))
    } else {
        info!(token = %workspace.token(), "Source has no audio stream, using empty track");
        (AudioTrack::default(), None)
    };

    Ok(IngestedMedia {
        video_path,
        info,
        audio,
        audio_path,
    })
}

/// Transcode a non-MP4 container to canonical H.264/AAC MP4.
///
/// A failed transcode must not leak the partially written output file.
async fn transcode_to_mp4(
    workspace: &RequestWorkspace,
    source: &std::path::Path,
    timeout_secs: u64,
) -> MediaResult<PathBuf> {
    let output = workspace.path_for("video.mp4");

    let cmd = FfmpegCommand::new(source, &output)
        .video_codec("libx264")
        .audio_codec("aac");

    match FfmpegRunner::new().with_timeout(timeout_secs).run(&cmd).await {
        Ok(()) => Ok(output),
        Err(e) => {
            if let Err(rm_err) = tokio::fs::remove_file(&output).await {
                if rm_err.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        path = %output.display(),
                        error = %rm_err,
                        "Failed to remove partial transcode output"
                    );
                }
            }
            Err(MediaError::transcode_failed(e.to_string()))
        }
    }
}

/// Extract the audio stream as mono 22050 Hz PCM WAV.
async fn extract_audio(
    workspace: &RequestWorkspace,
    video: &std::path::Path,
    timeout_secs: u64,
) -> MediaResult<PathBuf> {
    let output = workspace.path_for("audio.wav");

    let cmd = FfmpegCommand::new(video, &output)
        .no_video()
        .audio_codec("pcm_s16le")
        .channels(1)
        .sample_rate(AUDIO_SAMPLE_RATE);

    FfmpegRunner::new().with_timeout(timeout_secs).run(&cmd).await?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_extension_accepts_whitelist() {
        for ext in SUPPORTED_EXTENSIONS {
            assert_eq!(validate_extension(ext).unwrap(), ext);
        }
        assert_eq!(validate_extension(".MOV").unwrap(), "mov");
    }

    #[test]
    fn test_validate_extension_rejects_others() {
        for ext in ["txt", "wav", "exe", ""] {
            assert!(matches!(
                validate_extension(ext),
                Err(MediaError::UnsupportedFormat(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_ingest_rejects_bad_extension_before_writing() {
        let base = TempDir::new().unwrap();
        let ws = RequestWorkspace::create(base.path()).await.unwrap();

        let err = ingest(&ws, b"not a video", "txt", 10).await.unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat(_)));

        // Nothing was written into the workspace
        let mut entries = tokio::fs::read_dir(ws.root()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_upload() {
        let base = TempDir::new().unwrap();
        let ws = RequestWorkspace::create(base.path()).await.unwrap();

        let err = ingest(&ws, b"", "mp4", 10).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }

    #[test]
    fn test_audio_track_duration() {
        let track = AudioTrack {
            samples: vec![0.0; 44100],
            sample_rate: 22050,
        };
        assert!((track.duration_seconds() - 2.0).abs() < 1e-9);
        assert_eq!(AudioTrack::default().duration_seconds(), 0.0);
    }
}
