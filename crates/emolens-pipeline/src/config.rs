//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base directory for request-scoped workspaces
    pub temp_dir: PathBuf,
    /// Frame sampling cadence in samples per second of source video
    pub cadence_fps: f64,
    /// Concurrency limit for per-frame face classification
    pub frame_concurrency: usize,
    /// Timeout applied to every external adapter call
    pub adapter_timeout: Duration,
    /// Timeout for each FFmpeg invocation, in seconds
    pub ffmpeg_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("emolens"),
            cadence_fps: 1.0,
            frame_concurrency: 4,
            adapter_timeout: Duration::from_secs(30),
            ffmpeg_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temp_dir: std::env::var("PIPELINE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            cadence_fps: std::env::var("PIPELINE_CADENCE_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &f64| *v > 0.0)
                .unwrap_or(defaults.cadence_fps),
            frame_concurrency: std::env::var("PIPELINE_FRAME_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.frame_concurrency),
            adapter_timeout: Duration::from_secs(
                std::env::var("PIPELINE_ADAPTER_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            ffmpeg_timeout_secs: std::env::var("PIPELINE_FFMPEG_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ffmpeg_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.cadence_fps, 1.0);
        assert_eq!(config.frame_concurrency, 4);
        assert_eq!(config.adapter_timeout, Duration::from_secs(30));
    }
}
