//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input argument (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set seek position (before input, fast seek).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Drop the video stream.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Set output sample rate.
    pub fn sample_rate(self, rate: u32) -> Self {
        self.output_arg("-ar").output_arg(rate.to_string())
    }

    /// Set output channel count.
    pub fn channels(self, count: u32) -> Self {
        self.output_arg("-ac").output_arg(count.to_string())
    }

    /// Extract a single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-vframes").output_arg("1")
    }

    /// Output file path.
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with timeout enforcement.
///
/// Every invocation is bounded: on expiry the child process is killed and
/// `MediaError::Timeout` is returned, so no pipeline stage can block
/// indefinitely on a wedged decode.
pub struct FfmpegRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let output_future = async {
            let mut stderr_buf = Vec::new();
            if let Some(mut stderr) = child.stderr.take() {
                use tokio::io::AsyncReadExt;
                let _ = stderr.read_to_end(&mut stderr_buf).await;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stderr_buf))
        };

        let (status, stderr_buf) = if let Some(timeout_secs) = self.timeout_secs {
            // Bind before matching so the timed future (and its borrow of
            // `child`) is dropped before the kill path runs.
            let outcome = tokio::time::timeout(
                std::time::Duration::from_secs(timeout_secs),
                output_future,
            )
            .await;
            match outcome {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        "FFmpeg timed out after {} seconds, killing process",
                        timeout_secs
                    );
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(timeout_secs));
                }
            }
        } else {
            output_future.await?
        };

        if status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&stderr_buf).trim().to_string();
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr.is_empty()).then_some(stderr),
                status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mkv", "output.mp4")
            .video_codec("libx264")
            .audio_codec("aac");

        let args = cmd.build_args();
        assert!(args.contains(&"-c:v".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-c:a".to_string()));
        assert!(args.contains(&"aac".to_string()));
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_seek_precedes_input() {
        let cmd = FfmpegCommand::new("input.mp4", "frame.jpg")
            .seek(2.5)
            .single_frame();

        let args = cmd.build_args();
        let ss_pos = args.iter().position(|a| a == "-ss").unwrap();
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss_pos < i_pos);
        assert!(args.contains(&"2.500".to_string()));
        assert!(args.contains(&"-vframes".to_string()));
    }

    #[test]
    fn test_audio_extraction_args() {
        let cmd = FfmpegCommand::new("video.mp4", "audio.wav")
            .no_video()
            .audio_codec("pcm_s16le")
            .channels(1)
            .sample_rate(22050);

        let args = cmd.build_args();
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert!(args.contains(&"-ac".to_string()));
        assert!(args.contains(&"22050".to_string()));
    }
}
