//! # Analysis Pipeline
//!
//! Chains the DSP stages into one call:
//!
//! 1. Design the notch and lowpass filters for the buffer's sample rate
//! 2. Zero-phase filter the recording (notch, then lowpass)
//! 3. Compute magnitude spectra before and after filtering
//! 4. Pick the dominant frequency inside the detection band
//! 5. Compare it with the target
//!
//! Every run recomputes everything from the inputs; nothing is cached and
//! no state survives between calls.

use log::debug;
use serde::Serialize;

use crate::audio::{std_dev, AudioBuffer, SignalStats};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::fft::{magnitude_spectrum, Spectrum};
use crate::filter::{design_filters, FilterBank};
use crate::pitch::dominant_peak;
use crate::tuning::{evaluate, nearest_string, GuitarString, TuningResult, STANDARD_TUNING};
use crate::zero_phase::apply_filter_bank;

/// How much the filtering stage cleaned up the recording.
///
/// All three figures are ratios, so they do not depend on the input's
/// amplitude scale or on spectrum normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterEffectiveness {
    /// `(1 - σ_filtered / σ_raw) * 100`.
    pub noise_reduction_percent: f64,
    /// `|20 log10(σ_filtered / σ_raw)|`.
    pub snr_improvement_db: f64,
    /// Peak-to-mean ratio of the filtered spectrum over that of the raw one.
    pub clarity_gain: f64,
}

impl FilterEffectiveness {
    /// Compares raw and filtered signals. Degenerate inputs (silence, empty
    /// spectra) yield 0 for the affected figure.
    pub fn measure(
        raw: &AudioBuffer,
        filtered: &AudioBuffer,
        raw_spectrum: &Spectrum,
        filtered_spectrum: &Spectrum,
    ) -> Self {
        let raw_std = std_dev(raw.samples());
        let filtered_std = std_dev(filtered.samples());

        let noise_reduction_percent = if raw_std > 0.0 {
            (1.0 - filtered_std / raw_std) * 100.0
        } else {
            0.0
        };
        let snr_improvement_db = if filtered_std > 0.0 {
            (20.0 * (filtered_std / (raw_std + 1e-10)).log10()).abs()
        } else {
            0.0
        };

        let raw_clarity = peak_to_mean(raw_spectrum);
        let clarity_gain = if raw_clarity > 0.0 {
            peak_to_mean(filtered_spectrum) / raw_clarity
        } else {
            0.0
        };

        Self {
            noise_reduction_percent,
            snr_improvement_db,
            clarity_gain,
        }
    }
}

fn peak_to_mean(spectrum: &Spectrum) -> f64 {
    let mean = spectrum.mean_magnitude();
    match spectrum.peak() {
        Some((_, peak)) if mean > 0.0 => peak / mean,
        _ => 0.0,
    }
}

/// Everything one analysis run produces.
///
/// Only `tuning` is the pipeline's contract; the buffers, spectra and
/// statistics are read-only snapshots for display. The large snapshots are
/// skipped when serialising.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub tuning: TuningResult,
    /// The table string whose reference frequency is the target, if any.
    pub target_string: Option<GuitarString>,
    /// Magnitude of the winning bin in the filtered spectrum.
    pub peak_magnitude: f64,
    /// Bin spacing of both spectra, in Hz.
    pub resolution_hz: f64,
    pub raw_stats: SignalStats,
    pub filtered_stats: SignalStats,
    pub effectiveness: FilterEffectiveness,
    pub filters: FilterBank,
    #[serde(skip)]
    pub filtered: AudioBuffer,
    #[serde(skip)]
    pub raw_spectrum: Spectrum,
    #[serde(skip)]
    pub filtered_spectrum: Spectrum,
}

/// Runs the full pipeline against a fixed target frequency.
///
/// # Errors
/// * `InvalidParameter` - bad configuration, or a filter frequency at or
///   above the buffer's Nyquist frequency
/// * `InsufficientSamples` - the buffer is too short to filter
/// * `NoFrequencyInRange` - nothing to detect inside the detection band
pub fn analyze(
    buffer: &AudioBuffer,
    target_hz: f64,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    run_pipeline(buffer, config, |_| target_hz)
}

/// Runs the full pipeline against one of the standard-tuning strings.
pub fn analyze_string(
    buffer: &AudioBuffer,
    string: GuitarString,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    analyze(buffer, string.frequency(), config)
}

/// Runs the full pipeline, choosing as target the string nearest to the
/// detected frequency.
pub fn analyze_nearest_string(
    buffer: &AudioBuffer,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    run_pipeline(buffer, config, |detected| nearest_string(detected).frequency())
}

fn run_pipeline(
    buffer: &AudioBuffer,
    config: &AnalysisConfig,
    choose_target: impl FnOnce(f64) -> f64,
) -> Result<AnalysisReport> {
    config.validate()?;

    let filters = design_filters(buffer.sample_rate(), &config.filter)?;
    let filtered = apply_filter_bank(&filters, buffer)?;

    let raw_spectrum = magnitude_spectrum(buffer)?;
    let filtered_spectrum = magnitude_spectrum(&filtered)?;

    let peak = dominant_peak(&filtered_spectrum, &config.detection)?;
    let target_hz = choose_target(peak.frequency);
    let tuning = evaluate(peak.frequency, target_hz, config.tolerance_hz)?;

    debug!(
        "[ANALYSIS] Detected {:.2} Hz vs target {:.2} Hz: {} ({:+.1} cents)",
        tuning.detected_hz, tuning.target_hz, tuning.status, tuning.cents
    );

    Ok(AnalysisReport {
        tuning,
        target_string: STANDARD_TUNING
            .iter()
            .copied()
            .find(|s| s.frequency() == target_hz),
        peak_magnitude: peak.magnitude,
        resolution_hz: filtered_spectrum.resolution(),
        raw_stats: buffer.statistics(),
        filtered_stats: filtered.statistics(),
        effectiveness: FilterEffectiveness::measure(
            buffer,
            &filtered,
            &raw_spectrum,
            &filtered_spectrum,
        ),
        filters,
        filtered,
        raw_spectrum,
        filtered_spectrum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TunerError;
    use crate::tuning::TuningStatus;
    use std::f64::consts::PI;

    fn sine(freq: f64, amplitude: f64, rate: u32, secs: f64) -> Vec<f64> {
        let len = (f64::from(rate) * secs) as usize;
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / f64::from(rate)).sin())
            .collect()
    }

    #[test]
    fn reports_a_sharp_g_string() {
        let rate = 8_000;
        let buffer = AudioBuffer::new(sine(199.0, 0.5, rate, 2.0), rate).unwrap();
        let report = analyze_string(&buffer, GuitarString::G3, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.tuning.detected_hz, 199.0);
        assert_eq!(report.tuning.status, TuningStatus::Sharp);
        assert_eq!(report.target_string, Some(GuitarString::G3));
        assert_eq!(report.resolution_hz, 0.5);
        assert_eq!(report.filtered.len(), buffer.len());
        assert_eq!(report.raw_spectrum.len(), report.filtered_spectrum.len());
    }

    #[test]
    fn nearest_string_becomes_the_target() {
        let rate = 8_000;
        let buffer = AudioBuffer::new(sine(109.0, 0.5, rate, 1.0), rate).unwrap();
        let report = analyze_nearest_string(&buffer, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.target_string, Some(GuitarString::A2));
        assert_eq!(report.tuning.target_hz, 110.0);
        assert_eq!(report.tuning.status, TuningStatus::InTune);
    }

    #[test]
    fn filtering_removes_hum_energy() {
        let rate = 8_000;
        let hum = sine(50.0, 1.0, rate, 2.0);
        let tone = sine(146.0, 0.2, rate, 2.0);
        let samples: Vec<f64> = hum.iter().zip(&tone).map(|(h, t)| h + t).collect();
        let buffer = AudioBuffer::new(samples, rate).unwrap();

        let report = analyze_string(&buffer, GuitarString::D3, &AnalysisConfig::default()).unwrap();
        assert_eq!(report.tuning.detected_hz, 146.0);
        assert!(report.effectiveness.noise_reduction_percent > 50.0);
        assert!(report.effectiveness.snr_improvement_db > 6.0);
        assert!(report.effectiveness.clarity_gain > 0.0);
    }

    #[test]
    fn invalid_configuration_fails_before_filtering() {
        let rate = 8_000;
        let buffer = AudioBuffer::new(sine(110.0, 0.5, rate, 1.0), rate).unwrap();
        let config = AnalysisConfig {
            tolerance_hz: -1.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            analyze(&buffer, 110.0, &config),
            Err(TunerError::InvalidParameter { name: "tolerance", .. })
        ));
    }

    #[test]
    fn short_buffers_are_rejected() {
        let buffer = AudioBuffer::new(vec![0.1; 12], 8_000).unwrap();
        assert!(matches!(
            analyze(&buffer, 110.0, &AnalysisConfig::default()),
            Err(TunerError::InsufficientSamples { required: 16, actual: 12 })
        ));
    }

    #[test]
    fn silence_has_no_dominant_frequency() {
        let buffer = AudioBuffer::new(vec![0.0; 8_000], 8_000).unwrap();
        assert!(matches!(
            analyze(&buffer, 110.0, &AnalysisConfig::default()),
            Err(TunerError::NoFrequencyInRange { .. })
        ));
    }

    #[test]
    fn effectiveness_of_silence_is_zero() {
        let buffer = AudioBuffer::new(vec![0.0; 100], 1_000).unwrap();
        let spectrum = magnitude_spectrum(&buffer).unwrap();
        let effectiveness = FilterEffectiveness::measure(&buffer, &buffer, &spectrum, &spectrum);
        assert_eq!(effectiveness.noise_reduction_percent, 0.0);
        assert_eq!(effectiveness.snr_improvement_db, 0.0);
        assert_eq!(effectiveness.clarity_gain, 0.0);
    }
}
