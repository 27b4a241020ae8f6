//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Tolerance for the `frame_count == round(duration * fps)` invariant,
/// as a fraction of the expected count. Variable-frame-rate sources drift
/// a little; anything beyond this is a corrupt header.
const FRAME_COUNT_TOLERANCE: f64 = 0.25;

/// Video timing metadata driving frame sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoTiming {
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Frame rate (fps)
    pub frame_rate: f64,
    /// Total frame count
    pub frame_count: u64,
}

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Frame rate (fps)
    pub fps: f64,
    /// Total number of frames
    pub frame_count: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Video codec
    pub codec: String,
    /// Whether the container carries an audio stream
    pub has_audio: bool,
}

impl VideoInfo {
    /// Timing metadata for the frame sampler.
    pub fn timing(&self) -> VideoTiming {
        VideoTiming {
            duration_seconds: self.duration,
            frame_rate: self.fps,
            frame_count: self.frame_count,
        }
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// Probe a video file for information.
///
/// Rejects assets with no video stream or non-positive duration, and
/// checks that the declared frame count is consistent with
/// `round(duration * fps)` within tolerance.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::invalid_video("No video stream found"))?;

    let has_audio = probe.streams.iter().any(|s| s.codec_type == "audio");

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if duration <= 0.0 {
        return Err(MediaError::invalid_video("Video has zero duration"));
    }

    let fps = video_stream
        .avg_frame_rate
        .as_ref()
        .or(video_stream.r_frame_rate.as_ref())
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    // Some containers (notably transcoded MKV/AVI) omit nb_frames.
    let expected_frames = (duration * fps).round() as u64;
    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or(expected_frames);

    if !frame_count_consistent(frame_count, duration, fps) {
        return Err(MediaError::invalid_video(format!(
            "Frame count {} inconsistent with duration {:.2}s at {:.2} fps",
            frame_count, duration, fps
        )));
    }

    Ok(VideoInfo {
        duration,
        fps,
        frame_count,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        codec: video_stream.codec_name.clone().unwrap_or_default(),
        has_audio,
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}

/// Check `frame_count == round(duration * fps)` within tolerance.
fn frame_count_consistent(frame_count: u64, duration: f64, fps: f64) -> bool {
    let expected = (duration * fps).round();
    if expected <= 0.0 {
        return false;
    }
    let deviation = (frame_count as f64 - expected).abs();
    deviation <= (expected * FRAME_COUNT_TOLERANCE).max(2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("30/0").is_none());
    }

    #[test]
    fn test_frame_count_consistency() {
        // 10s at 30fps
        assert!(frame_count_consistent(300, 10.0, 30.0));
        assert!(frame_count_consistent(298, 10.0, 30.0));
        // Wildly off -> corrupt header
        assert!(!frame_count_consistent(10, 10.0, 30.0));
        assert!(!frame_count_consistent(300, 0.0, 30.0));
    }

    #[test]
    fn test_short_clip_tolerance() {
        // Very short clips get the absolute slack of 2 frames
        assert!(frame_count_consistent(3, 0.1, 30.0));
    }
}
