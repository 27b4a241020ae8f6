//! Voice prosody feature extraction.
//!
//! Computes pitch statistics (YIN fundamental-frequency estimation over
//! fixed-hop analysis frames) and RMS intensity from a decoded waveform.
//! Pitch statistics are taken over voiced frames only and clipped to a
//! working band; intensity is defined for every frame, silence included.

use tracing::debug;

use crate::ingest::AudioTrack;

/// Analysis frame length in samples.
const FRAME_LENGTH: usize = 2048;

/// Hop between analysis frames in samples.
pub const DEFAULT_HOP_LENGTH: usize = 512;

/// Pitch search band, in Hz. Covers the full human-voice range the
/// estimator is asked to track.
const PITCH_FMIN: f64 = 50.0;
const PITCH_FMAX: f64 = 3000.0;

/// Working band the voiced estimates are clipped to before statistics.
/// The tighter low edge removes subharmonic/octave-tracking outliers.
const CLIP_MIN_HZ: f64 = 100.0;
const CLIP_MAX_HZ: f64 = 3000.0;

/// Absolute threshold on the cumulative mean-normalized difference below
/// which a lag is accepted as periodic.
const YIN_THRESHOLD: f64 = 0.1;

/// Frames whose RMS falls below this floor are unvoiced by definition.
const SILENCE_RMS_FLOOR: f64 = 1e-4;

/// Prosodic statistics for one audio track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VoiceFeatures {
    /// Mean voiced pitch in Hz, 0.0 if no voiced frames
    pub avg_pitch_hz: f64,
    /// Minimum voiced pitch in Hz, 0.0 if no voiced frames
    pub min_pitch_hz: f64,
    /// 95th-percentile voiced pitch in Hz (robust max), 0.0 if no voiced frames
    pub max_pitch_hz: f64,
    /// Mean frame-wise RMS over all frames, voiced and unvoiced
    pub avg_intensity: f64,
}

/// Pitch and intensity extractor over fixed-size analysis frames.
#[derive(Debug, Clone)]
pub struct VoiceFeatureExtractor {
    hop_length: usize,
    frame_length: usize,
}

impl Default for VoiceFeatureExtractor {
    fn default() -> Self {
        Self {
            hop_length: DEFAULT_HOP_LENGTH,
            frame_length: FRAME_LENGTH,
        }
    }
}

impl VoiceFeatureExtractor {
    pub fn new(hop_length: usize) -> Self {
        Self {
            hop_length: hop_length.max(1),
            frame_length: FRAME_LENGTH,
        }
    }

    /// Extract pitch and intensity statistics from a waveform.
    ///
    /// An empty track returns all-zero features. Pitch fields are always
    /// finite, never NaN.
    pub fn extract(&self, track: &AudioTrack) -> VoiceFeatures {
        if track.samples.is_empty() || track.sample_rate == 0 {
            return VoiceFeatures::default();
        }

        let samples = &track.samples;
        let sr = track.sample_rate as f64;

        // Voiced pitch estimates, one candidate per full analysis frame.
        let mut voiced: Vec<f64> = Vec::new();
        let mut start = 0;
        while start + self.frame_length <= samples.len() {
            let frame = &samples[start..start + self.frame_length];
            if let Some(f0) = yin_frame(frame, sr) {
                voiced.push(f0.clamp(CLIP_MIN_HZ, CLIP_MAX_HZ));
            }
            start += self.hop_length;
        }

        let (avg_pitch_hz, min_pitch_hz, max_pitch_hz) = if voiced.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let avg = voiced.iter().sum::<f64>() / voiced.len() as f64;
            let min = voiced.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = percentile(&voiced, 95.0);
            (avg, min, max)
        };

        // Intensity covers every frame, including trailing partials.
        let mut rms_values: Vec<f64> = Vec::new();
        let mut start = 0;
        while start < samples.len() {
            let end = (start + self.frame_length).min(samples.len());
            rms_values.push(rms(&samples[start..end]));
            start += self.hop_length;
        }
        let avg_intensity = if rms_values.is_empty() {
            0.0
        } else {
            rms_values.iter().sum::<f64>() / rms_values.len() as f64
        };

        debug!(
            voiced_frames = voiced.len(),
            total_frames = rms_values.len(),
            avg_pitch = avg_pitch_hz,
            "Extracted voice features"
        );

        VoiceFeatures {
            avg_pitch_hz,
            min_pitch_hz,
            max_pitch_hz,
            avg_intensity,
        }
    }
}

/// Root-mean-square energy of a frame.
fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / frame.len() as f64).sqrt()
}

/// YIN fundamental-frequency estimate for one analysis frame.
///
/// Returns `None` for unvoiced frames: near-silent frames, and frames
/// where no lag in the search band dips under the periodicity threshold.
fn yin_frame(frame: &[f32], sample_rate: f64) -> Option<f64> {
    if rms(frame) < SILENCE_RMS_FLOOR {
        return None;
    }

    let window = frame.len() / 2;
    let tau_min = ((sample_rate / PITCH_FMAX).floor() as usize).max(2);
    let tau_max = ((sample_rate / PITCH_FMIN).ceil() as usize).min(window - 1);
    if tau_min >= tau_max {
        return None;
    }

    // Difference function over the lag search range.
    let mut diff = vec![0.0f64; tau_max + 1];
    for (tau, d) in diff.iter_mut().enumerate().skip(1) {
        let mut acc = 0.0f64;
        for j in 0..window {
            let delta = (frame[j] - frame[j + tau]) as f64;
            acc += delta * delta;
        }
        *d = acc;
    }

    // Cumulative mean-normalized difference.
    let mut cmndf = vec![1.0f64; tau_max + 1];
    let mut running_sum = 0.0f64;
    for tau in 1..=tau_max {
        running_sum += diff[tau];
        cmndf[tau] = if running_sum > f64::EPSILON {
            diff[tau] * tau as f64 / running_sum
        } else {
            1.0
        };
    }

    // First lag under threshold, refined to the local minimum.
    let mut tau = tau_min;
    while tau <= tau_max {
        if cmndf[tau] < YIN_THRESHOLD {
            while tau + 1 <= tau_max && cmndf[tau + 1] < cmndf[tau] {
                tau += 1;
            }
            let refined = parabolic_interpolation(&cmndf, tau);
            return Some(sample_rate / refined);
        }
        tau += 1;
    }

    None
}

/// Parabolic interpolation of the minimum around lag `tau`.
fn parabolic_interpolation(values: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= values.len() {
        return tau as f64;
    }
    let (a, b, c) = (values[tau - 1], values[tau], values[tau + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f64::EPSILON {
        return tau as f64;
    }
    let offset = 0.5 * (a - c) / denom;
    tau as f64 + offset.clamp(-1.0, 1.0)
}

/// Percentile with linear interpolation between ranks.
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}
