//! WAV decoding into a normalized mono waveform.

use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::error::MediaResult;
use crate::ingest::AudioTrack;

/// Read a WAV file into a mono f32 track normalized to [-1, 1].
///
/// Integer PCM of any bit depth and IEEE float are accepted. Multi-channel
/// audio is downmixed by averaging channels.
pub fn read_wav(path: impl AsRef<Path>) -> MediaResult<AudioTrack> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = ((1u64 << (spec.bits_per_sample - 1)) as f32).max(1.0);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(AudioTrack {
        samples: mono,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_mono_pcm16() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, 16384, -16384, 32767]);

        let track = read_wav(&path).unwrap();
        assert_eq!(track.sample_rate, 22050);
        assert_eq!(track.samples.len(), 4);
        assert!((track.samples[1] - 0.5).abs() < 1e-3);
        assert!((track.samples[2] + 0.5).abs() < 1e-3);
        assert!(track.samples[3] <= 1.0);
    }

    #[test]
    fn test_stereo_downmix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        // L=16384, R=-16384 averages to silence
        write_wav(&path, 2, &[16384, -16384, 16384, -16384]);

        let track = read_wav(&path).unwrap();
        assert_eq!(track.samples.len(), 2);
        for s in &track.samples {
            assert!(s.abs() < 1e-3);
        }
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(read_wav("/nonexistent/audio.wav").is_err());
    }
}
