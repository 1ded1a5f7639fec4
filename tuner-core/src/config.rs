//! # Analysis Configuration
//!
//! Tunable parameters of the pipeline. Every field has a default matching a
//! standard guitar setup on 50 Hz mains, and every field may be omitted when
//! deserialising, so a config file only needs the values it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};

/// Default mains (line-noise) frequency rejected by the notch stage.
pub const DEFAULT_NOTCH_HZ: f64 = 50.0;
/// Default notch quality factor.
pub const DEFAULT_NOTCH_Q: f64 = 30.0;
/// Default lowpass cutoff.
pub const DEFAULT_LOWPASS_CUTOFF_HZ: f64 = 500.0;
/// Default lowpass order.
pub const DEFAULT_LOWPASS_ORDER: usize = 4;
/// Default detection band, covering a guitar's open strings with margin.
pub const DEFAULT_BAND_MIN_HZ: f64 = 70.0;
pub const DEFAULT_BAND_MAX_HZ: f64 = 400.0;
/// Default "in tune" tolerance.
pub const DEFAULT_TOLERANCE_HZ: f64 = 2.0;

/// Parameters of the two noise-rejection filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub notch_hz: f64,
    pub notch_q: f64,
    pub lowpass_cutoff_hz: f64,
    pub lowpass_order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            notch_hz: DEFAULT_NOTCH_HZ,
            notch_q: DEFAULT_NOTCH_Q,
            lowpass_cutoff_hz: DEFAULT_LOWPASS_CUTOFF_HZ,
            lowpass_order: DEFAULT_LOWPASS_ORDER,
        }
    }
}

/// Inclusive frequency band searched for the dominant peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionBand {
    pub min_hz: f64,
    pub max_hz: f64,
}

impl Default for DetectionBand {
    fn default() -> Self {
        Self {
            min_hz: DEFAULT_BAND_MIN_HZ,
            max_hz: DEFAULT_BAND_MAX_HZ,
        }
    }
}

impl DetectionBand {
    pub fn new(min_hz: f64, max_hz: f64) -> Self {
        Self { min_hz, max_hz }
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.min_hz && freq <= self.max_hz
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_hz.is_finite() || self.min_hz < 0.0 {
            return Err(TunerError::invalid(
                "detection band minimum",
                self.min_hz,
                "must be a finite, non-negative frequency",
            ));
        }
        if !self.max_hz.is_finite() || self.max_hz < self.min_hz {
            return Err(TunerError::invalid(
                "detection band maximum",
                self.max_hz,
                format!("must be finite and not below the minimum ({} Hz)", self.min_hz),
            ));
        }
        Ok(())
    }
}

/// Everything the pipeline needs besides the audio and the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub filter: FilterConfig,
    pub detection: DetectionBand,
    pub tolerance_hz: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            detection: DetectionBand::default(),
            tolerance_hz: DEFAULT_TOLERANCE_HZ,
        }
    }
}

impl AnalysisConfig {
    /// Checks the parameters that do not depend on the sample rate.
    ///
    /// Frequency-versus-Nyquist checks happen at filter design time, once the
    /// sample rate is known.
    pub fn validate(&self) -> Result<()> {
        validate_tolerance(self.tolerance_hz)?;
        self.detection.validate()?;
        if self.filter.lowpass_order == 0 {
            return Err(TunerError::invalid("lowpass order", 0.0, "must be at least 1"));
        }
        if !(self.filter.notch_q.is_finite() && self.filter.notch_q > 0.0) {
            return Err(TunerError::invalid(
                "notch quality factor",
                self.filter.notch_q,
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_tolerance(tolerance_hz: f64) -> Result<()> {
    if tolerance_hz.is_finite() && tolerance_hz > 0.0 {
        Ok(())
    } else {
        Err(TunerError::invalid(
            "tolerance",
            tolerance_hz,
            "must be greater than 0 Hz",
        ))
    }
}
