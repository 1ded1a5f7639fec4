use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use tuner_core::{AudioBuffer, MAX_DURATION_SECS};

/// Reads an uncompressed WAV file into a mono buffer.
///
/// Integer PCM is scaled to [-1, 1), float samples are taken as they are,
/// and channels are averaged. Only the first [`MAX_DURATION_SECS`] seconds
/// are read.
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));
    let total_frames = reader.duration() as usize;
    let max_frames = AudioBuffer::max_samples(spec.sample_rate);
    let wanted = total_frames.min(max_frames) * channels;

    if total_frames > max_frames {
        log::info!(
            "Audio trimmed to {} seconds for processing ({} of {} frames)",
            MAX_DURATION_SECS,
            max_frames,
            total_frames
        );
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .take(wanted)
            .map(|s| s.map(f64::from))
            .collect::<Result<Vec<f64>, _>>(),
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f64;
            reader
                .samples::<i32>()
                .take(wanted)
                .map(|s| s.map(|v| f64::from(v) / scale))
                .collect::<Result<Vec<f64>, _>>()
        }
    }
    .with_context(|| format!("Failed to decode samples from {}", path.display()))?;

    let mono: Vec<f64> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect();

    log::debug!(
        "Decoded {} frames ({} channel(s), {}-bit {:?}) at {} Hz",
        mono.len(),
        channels,
        spec.bits_per_sample,
        spec.sample_format,
        spec.sample_rate
    );

    AudioBuffer::new(mono, spec.sample_rate)
        .with_context(|| format!("Unusable audio in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::path::PathBuf;

    fn temp_wav(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("guitar-tuner-{}-{name}.wav", std::process::id()))
    }

    #[test]
    fn reads_16_bit_stereo_as_mono() {
        let path = temp_wav("stereo");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16_384_i16, 0_i16), (-16_384, -16_384), (0, 8_192)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(buffer.sample_rate(), 8_000);
        assert_eq!(buffer.samples(), &[0.25, -0.5, 0.125]);
    }

    #[test]
    fn reads_float_and_trims_to_five_seconds() {
        let path = temp_wav("float");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..700 {
            writer.write_sample(i as f32 / 1_000.0).unwrap();
        }
        writer.finalize().unwrap();

        let buffer = load_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(buffer.len(), 500);
        assert!((buffer.samples()[499] - 0.499).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_wav(Path::new("/definitely/not/here.wav")).is_err());
    }
}
