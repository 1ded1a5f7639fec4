// tuner-core/src/lib.rs

//! The core logic for the guitar tuner.
//! This crate is responsible for noise-rejection filtering, spectral
//! analysis, dominant-frequency detection and the tuning verdict. It is
//! completely headless: audio capture, decoding and display live in the
//! callers, which hand over an already-recorded buffer.
//!
//! ```no_run
//! use tuner_core::{analyze_string, AnalysisConfig, AudioBuffer, GuitarString};
//!
//! # fn main() -> tuner_core::Result<()> {
//! let samples: Vec<f64> = vec![0.0; 44_100];
//! let buffer = AudioBuffer::new(samples, 44_100)?;
//! let report = analyze_string(&buffer, GuitarString::A2, &AnalysisConfig::default())?;
//! println!("{} ({:+.1} cents)", report.tuning.status, report.tuning.cents);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod filter;
pub mod pitch;
pub mod session;
pub mod tuning;
pub mod zero_phase;

pub use analysis::{
    analyze, analyze_nearest_string, analyze_string, AnalysisReport, FilterEffectiveness,
};
pub use audio::{AudioBuffer, SignalStats, MAX_DURATION_SECS};
pub use config::{AnalysisConfig, DetectionBand, FilterConfig};
pub use error::{Result, TunerError};
pub use fft::Spectrum;
pub use filter::{FilterBank, FilterCoefficients};
pub use session::{TunerSession, TuningTarget};
pub use tuning::{GuitarString, TuningResult, TuningStatus, STANDARD_TUNING};
