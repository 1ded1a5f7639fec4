//! # Error Module
//!
//! Every failure the DSP pipeline can report. All of them are recoverable at
//! the caller: they mean "try again with different input" (a longer
//! recording, a cleaner signal, a corrected configuration).

use thiserror::Error;

/// Error type for tuner analysis operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TunerError {
    /// A filter design, detection band or tolerance parameter is out of range.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. "lowpass cutoff").
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// Which constraint was violated.
        reason: String,
    },

    /// The buffer is too short for stable zero-phase filtering.
    #[error("insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples {
        /// Minimum sample count that would be accepted.
        required: usize,
        /// Sample count actually supplied.
        actual: usize,
    },

    /// No spectral content was found inside the detection band.
    #[error("could not detect a frequency between {min_hz} Hz and {max_hz} Hz")]
    NoFrequencyInRange {
        /// Lower edge of the detection band.
        min_hz: f64,
        /// Upper edge of the detection band.
        max_hz: f64,
    },
}

impl TunerError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        TunerError::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TunerError>;
