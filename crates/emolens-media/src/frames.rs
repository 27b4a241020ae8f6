//! Frame sampling at a fixed temporal cadence.
//!
//! Sampling is driven by wall-clock timestamps rather than source frame
//! indices, so a 24 fps and a 60 fps encode of the same clip yield the
//! same number of samples.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::VideoTiming;
use crate::workspace::RequestWorkspace;

/// Default sampling cadence: one frame per second of source video.
pub const DEFAULT_CADENCE_FPS: f64 = 1.0;

/// A frame extracted from the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Timestamp index in the generated sequence
    pub index: usize,
    /// Position in the source, in `[0, duration)`
    pub timestamp_seconds: f64,
    /// JPEG path inside the request workspace
    pub path: PathBuf,
}

/// Generate sampling timestamps `0, 1/c, 2/c, ...` strictly below
/// `duration_seconds`.
pub fn sample_timestamps(duration_seconds: f64, cadence_fps: f64) -> Vec<f64> {
    if duration_seconds <= 0.0 || cadence_fps <= 0.0 {
        return Vec::new();
    }
    let step = 1.0 / cadence_fps;
    let mut timestamps = Vec::new();
    let mut k = 0u64;
    loop {
        let t = k as f64 * step;
        if t >= duration_seconds {
            break;
        }
        timestamps.push(t);
        k += 1;
    }
    timestamps
}

/// Sample frames from a video at the given cadence.
///
/// Each timestamp seeks to the nearest decodable frame and writes a JPEG
/// into the workspace. Frames that fail to decode are skipped, never
/// retried. Zero surviving frames is fatal (`NoFramesExtracted`).
pub async fn sample_frames(
    workspace: &RequestWorkspace,
    video_path: impl AsRef<Path>,
    timing: &VideoTiming,
    cadence_fps: f64,
    ffmpeg_timeout_secs: u64,
) -> MediaResult<Vec<FrameSample>> {
    let video_path = video_path.as_ref();

    // A cadence above the source frame rate would just duplicate frames.
    let cadence = cadence_fps.min(timing.frame_rate).max(f64::MIN_POSITIVE);
    let timestamps = sample_timestamps(timing.duration_seconds, cadence);

    let mut samples = Vec::with_capacity(timestamps.len());
    for (index, &t) in timestamps.iter().enumerate() {
        let frame_path = workspace.path_for(format!("frame_{}.jpg", index));

        let cmd = FfmpegCommand::new(video_path, &frame_path)
            .seek(t)
            .single_frame();

        match FfmpegRunner::new()
            .with_timeout(ffmpeg_timeout_secs)
            .run(&cmd)
            .await
        {
            Ok(()) if frame_path.exists() => {
                samples.push(FrameSample {
                    index,
                    timestamp_seconds: t,
                    path: frame_path,
                });
            }
            Ok(()) => {
                // ffmpeg can exit 0 without producing output on an
                // out-of-range seek
                warn!(index, timestamp = t, "Seek produced no frame, skipping");
            }
            Err(e) => {
                warn!(index, timestamp = t, error = %e, "Frame decode failed, skipping");
            }
        }
    }

    if samples.is_empty() {
        return Err(MediaError::NoFramesExtracted);
    }

    debug!(
        extracted = samples.len(),
        requested = timestamps.len(),
        "Frame sampling complete"
    );

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_count_matches_duration_times_cadence() {
        for (duration, cadence) in [(10.0, 1.0), (7.3, 2.0), (12.0, 0.5), (300.0, 1.0)] {
            let timestamps = sample_timestamps(duration, cadence);
            let expected = (duration * cadence).floor() as i64;
            let got = timestamps.len() as i64;
            assert!(
                (got - expected).abs() <= 1,
                "duration={} cadence={} got={} expected={}",
                duration,
                cadence,
                got,
                expected
            );
        }
    }

    #[test]
    fn test_timestamps_lie_in_half_open_range() {
        let duration = 9.7;
        let timestamps = sample_timestamps(duration, 3.0);
        assert!(!timestamps.is_empty());
        for t in &timestamps {
            assert!(*t >= 0.0 && *t < duration);
        }
    }

    #[test]
    fn test_timestamps_strictly_increasing() {
        let timestamps = sample_timestamps(10.0, 2.0);
        for pair in timestamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_first_timestamp_is_zero() {
        let timestamps = sample_timestamps(5.0, 1.0);
        assert_eq!(timestamps[0], 0.0);
    }

    #[test]
    fn test_degenerate_inputs_yield_no_timestamps() {
        assert!(sample_timestamps(0.0, 1.0).is_empty());
        assert!(sample_timestamps(-1.0, 1.0).is_empty());
        assert!(sample_timestamps(10.0, 0.0).is_empty());
    }
}
