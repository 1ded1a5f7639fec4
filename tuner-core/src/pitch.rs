//! # Pitch Detection Module
//!
//! Picks the dominant frequency of a filtered recording: the strongest
//! spectral bin inside a band that covers the fundamentals of a guitar's
//! open strings. Restricting the search to that band keeps residual hum
//! below it and strong upper harmonics above it from winning.

use log::debug;

use crate::config::DetectionBand;
use crate::error::{Result, TunerError};
use crate::fft::Spectrum;

/// A band peak weaker than this fraction of the strongest bin in the whole
/// spectrum (-180 dB) is treated as rounding noise, not content.
pub const NOISE_FLOOR_RATIO: f64 = 1e-9;

/// The winning bin of a band-limited peak search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantPeak {
    pub frequency: f64,
    pub magnitude: f64,
}

/// Returns the frequency (Hz) of the strongest bin within `band`.
///
/// # Errors
/// * `NoFrequencyInRange` - if no bin falls inside the band, or the band
///   holds no energy above [`NOISE_FLOOR_RATIO`]
pub fn detect_dominant_frequency(spectrum: &Spectrum, band: &DetectionBand) -> Result<f64> {
    dominant_peak(spectrum, band).map(|peak| peak.frequency)
}

/// Band-limited peak search.
///
/// Bins are visited in increasing frequency and only a strictly larger
/// magnitude replaces the current best, so on an exact tie the lowest
/// frequency wins. That favours the fundamental over its harmonics.
pub fn dominant_peak(spectrum: &Spectrum, band: &DetectionBand) -> Result<DominantPeak> {
    let no_frequency = || TunerError::NoFrequencyInRange {
        min_hz: band.min_hz,
        max_hz: band.max_hz,
    };

    let mut best: Option<DominantPeak> = None;
    for (frequency, magnitude) in spectrum.iter().filter(|(f, _)| band.contains(*f)) {
        match best {
            Some(current) if magnitude <= current.magnitude => {}
            _ => {
                best = Some(DominantPeak {
                    frequency,
                    magnitude,
                })
            }
        }
    }

    let floor = spectrum.peak().map_or(0.0, |(_, mag)| mag * NOISE_FLOOR_RATIO);

    match best {
        Some(peak) if peak.magnitude > floor && peak.magnitude > 0.0 => {
            debug!(
                "[PITCH] Dominant frequency {:.2} Hz (magnitude {:.3e}) in [{}, {}] Hz",
                peak.frequency, peak.magnitude, band.min_hz, band.max_hz
            );
            Ok(peak)
        }
        Some(_) => {
            debug!("[PITCH] Band [{}, {}] Hz holds no energy", band.min_hz, band.max_hz);
            Err(no_frequency())
        }
        None => {
            debug!(
                "[PITCH] No spectrum bins fall inside [{}, {}] Hz",
                band.min_hz, band.max_hz
            );
            Err(no_frequency())
        }
    }
}
