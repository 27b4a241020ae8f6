//! Pipeline error types.
//!
//! The taxonomy distinguishes client-caused failures (bad upload, broken
//! video) from internal ones (transcode capability, IO) so the transport
//! layer can map them onto 4xx/5xx without inspecting messages.

use thiserror::Error;

use emolens_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Empty upload")]
    EmptyUpload,

    #[error("Invalid video: {0}")]
    InvalidVideo(String),

    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    #[error("No frames could be extracted from the video")]
    NoFramesExtracted,

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Media error: {0}")]
    Media(MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True when the failure was caused by the uploaded input rather than
    /// the system (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_)
                | Self::EmptyUpload
                | Self::InvalidVideo(_)
                | Self::InvalidAudio(_)
                | Self::NoFramesExtracted
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::UnsupportedFormat(ext) => Self::UnsupportedFormat(ext),
            MediaError::TranscodeFailed(msg) => Self::Transcode(msg),
            MediaError::NoFramesExtracted => Self::NoFramesExtracted,
            MediaError::InvalidVideo(msg) => Self::InvalidVideo(msg),
            MediaError::WavDecode(e) => Self::InvalidAudio(e.to_string()),
            other => Self::Media(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(PipelineError::UnsupportedFormat("txt".into()).is_client_error());
        assert!(PipelineError::EmptyUpload.is_client_error());
        assert!(PipelineError::NoFramesExtracted.is_client_error());
        assert!(!PipelineError::Transcode("boom".into()).is_client_error());
        assert!(!PipelineError::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_media_error_mapping() {
        let err: PipelineError = MediaError::UnsupportedFormat("gif".into()).into();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));

        let err: PipelineError = MediaError::NoFramesExtracted.into();
        assert!(matches!(err, PipelineError::NoFramesExtracted));

        let err: PipelineError = MediaError::FfmpegNotFound.into();
        assert!(matches!(err, PipelineError::Media(_)));
    }
}
