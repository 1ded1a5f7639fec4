//! # Audio Buffer Module
//!
//! This module holds the bounded, already-captured mono recording the
//! pipeline works on. Capture and decoding happen elsewhere; by the time
//! samples reach this module they are plain normalized floats.
//!
//! ## Features
//! - Sample-rate validation
//! - Truncation to the maximum analysis duration (first samples are kept)
//! - Summary statistics for display (peak, mean, RMS, standard deviation)

use log::debug;
use serde::Serialize;

use crate::error::{Result, TunerError};

/// Longest recording the pipeline accepts, in seconds.
///
/// Longer input is truncated by keeping the first
/// `MAX_DURATION_SECS * sample_rate` samples.
pub const MAX_DURATION_SECS: usize = 5;

/// A mono recording tagged with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f64>,
    sample_rate: u32,
}

/// Summary statistics of a buffer, shown alongside the tuning result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalStats {
    pub sample_count: usize,
    pub duration_secs: f64,
    pub max_amplitude: f64,
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub peak_to_peak: f64,
}

impl AudioBuffer {
    /// Creates a buffer, truncating anything beyond [`MAX_DURATION_SECS`].
    ///
    /// # Errors
    /// * `InvalidParameter` - if `sample_rate` is zero
    pub fn new(mut samples: Vec<f64>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(TunerError::invalid(
                "sample rate",
                0.0,
                "must be greater than 0 Hz",
            ));
        }

        let max_samples = Self::max_samples(sample_rate);
        if samples.len() > max_samples {
            debug!(
                "[AUDIO] Truncating {} samples to {} ({} s at {} Hz)",
                samples.len(),
                max_samples,
                MAX_DURATION_SECS,
                sample_rate
            );
            samples.truncate(max_samples);
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convenience constructor for `f32` PCM, as delivered by most decoders.
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Result<Self> {
        Self::new(samples.iter().map(|&s| f64::from(s)).collect(), sample_rate)
    }

    /// Maximum number of samples kept for a given sample rate.
    pub fn max_samples(sample_rate: u32) -> usize {
        MAX_DURATION_SECS * sample_rate as usize
    }

    /// Builds a sibling buffer (same sample rate) from processed samples.
    ///
    /// Used by the filtering stage, which always preserves length.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> Self {
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Nyquist frequency (half the sample rate) in Hz.
    pub fn nyquist(&self) -> f64 {
        f64::from(self.sample_rate) / 2.0
    }

    /// Computes summary statistics. An empty buffer reports all zeros.
    pub fn statistics(&self) -> SignalStats {
        let n = self.samples.len();
        if n == 0 {
            return SignalStats {
                sample_count: 0,
                duration_secs: 0.0,
                max_amplitude: 0.0,
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let max = self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = self.samples.iter().sum::<f64>() / n as f64;
        let rms = (self.samples.iter().map(|s| s * s).sum::<f64>() / n as f64).sqrt();

        SignalStats {
            sample_count: n,
            duration_secs: self.duration_secs(),
            max_amplitude: max,
            mean,
            rms,
            std_dev: std_dev(&self.samples),
            peak_to_peak: max - min,
        }
    }
}

/// Population standard deviation (divides by N).
pub(crate) fn std_dev(samples: &[f64]) -> f64 {
    let n = samples.len();
    if n == 0 {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n as f64;
    variance.sqrt()
}
