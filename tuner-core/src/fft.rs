//! # Fast Fourier Transform (FFT) Module
//!
//! This module computes the magnitude spectrum of a recording using RustFFT.
//! Only the strictly positive frequency bins are kept: the DC bin and the
//! mirrored negative-frequency half carry no extra information for a real
//! signal.
//!
//! ## Conventions
//! - Bin `k` sits at `k * sample_rate / N`, so the resolution is
//!   `sample_rate / N` Hz
//! - Bins `1..=(N - 1) / 2` are returned; for even `N` the Nyquist bin is
//!   dropped as well
//! - Magnitudes are the raw `|X[k]|` with no scaling; use
//!   [`Spectrum::amplitude_scaled`] to compare spectra of different lengths

use log::trace;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

use crate::audio::AudioBuffer;
use crate::error::{Result, TunerError};

/// Positive-frequency magnitude spectrum of a real signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
    signal_len: usize,
    sample_rate: u32,
}

impl Spectrum {
    #[cfg(test)]
    pub(crate) fn from_parts(
        frequencies: Vec<f64>,
        magnitudes: Vec<f64>,
        signal_len: usize,
        sample_rate: u32,
    ) -> Self {
        debug_assert_eq!(frequencies.len(), magnitudes.len());
        Self {
            frequencies,
            magnitudes,
            signal_len,
            sample_rate,
        }
    }

    /// Bin centre frequencies in Hz, strictly increasing and positive.
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Unnormalized magnitudes, one per frequency.
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Number of samples the spectrum was computed from.
    pub fn signal_len(&self) -> usize {
        self.signal_len
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Spacing between adjacent bins, `sample_rate / N` Hz.
    pub fn resolution(&self) -> f64 {
        f64::from(self.sample_rate) / self.signal_len as f64
    }

    /// Iterates `(frequency, magnitude)` pairs in increasing frequency.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }

    /// The `(frequency, magnitude)` of the strongest bin over the whole
    /// spectrum. Ties go to the lowest frequency.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter().fold(None, |best, (freq, mag)| match best {
            Some((_, best_mag)) if mag <= best_mag => best,
            _ => Some((freq, mag)),
        })
    }

    /// Magnitude of the bin closest to `freq_hz`.
    pub fn magnitude_near(&self, freq_hz: f64) -> Option<f64> {
        self.iter()
            .min_by(|a, b| {
                (a.0 - freq_hz)
                    .abs()
                    .partial_cmp(&(b.0 - freq_hz).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(_, mag)| mag)
    }

    /// Mean magnitude across all bins, 0 for an empty spectrum.
    pub fn mean_magnitude(&self) -> f64 {
        if self.magnitudes.is_empty() {
            return 0.0;
        }
        self.magnitudes.iter().sum::<f64>() / self.magnitudes.len() as f64
    }

    /// Copy with magnitudes scaled by `2 / N`, so that a sinusoid of
    /// amplitude `A` centred on a bin reads approximately `A`.
    pub fn amplitude_scaled(&self) -> Spectrum {
        let scale = 2.0 / self.signal_len as f64;
        Spectrum {
            magnitudes: self.magnitudes.iter().map(|m| m * scale).collect(),
            ..self.clone()
        }
    }
}

/// Computes the positive-frequency magnitude spectrum of `buffer`.
///
/// # Errors
/// * `InsufficientSamples` - if the buffer is empty
pub fn magnitude_spectrum(buffer: &AudioBuffer) -> Result<Spectrum> {
    spectrum_of(buffer.samples(), buffer.sample_rate())
}

/// Same as [`magnitude_spectrum`] for a bare slice.
pub fn spectrum_of(signal: &[f64], sample_rate: u32) -> Result<Spectrum> {
    let n = signal.len();
    if n == 0 {
        return Err(TunerError::InsufficientSamples {
            required: 1,
            actual: 0,
        });
    }
    if sample_rate == 0 {
        return Err(TunerError::invalid("sample rate", 0.0, "must be greater than 0 Hz"));
    }

    let spectrum = perform_fft(signal);
    let resolution = f64::from(sample_rate) / n as f64;
    let positive_bins = (n - 1) / 2;

    let frequencies = (1..=positive_bins).map(|k| k as f64 * resolution).collect();
    let magnitudes = spectrum_to_magnitudes(&spectrum[1..=positive_bins]);

    trace!(
        "[FFT] {} samples -> {} bins at {:.4} Hz resolution",
        n,
        positive_bins,
        resolution
    );

    Ok(Spectrum {
        frequencies,
        magnitudes,
        signal_len: n,
        sample_rate,
    })
}

/// Performs a forward FFT on a real signal and returns the complex spectrum.
fn perform_fft(signal: &[f64]) -> Vec<Complex<f64>> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(signal.len());

    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .collect();

    fft.process(&mut buffer);
    buffer
}

/// Extracts magnitudes from complex bins.
fn spectrum_to_magnitudes(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum
        .iter()
        .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect()
}
