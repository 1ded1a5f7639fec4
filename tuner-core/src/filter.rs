//! # Filter Design Module
//!
//! Builds the two fixed IIR filters that clean a recording before pitch
//! analysis: a narrow notch that removes mains hum, and a Butterworth
//! lowpass that removes hiss and upper harmonics above the guitar range.
//!
//! Both designs are expressed as transfer-function coefficients
//! (`b` feed-forward, `a` feedback, `a[0] == 1`) normalized to the Nyquist
//! frequency of the recording, so they must be recomputed whenever the
//! sample rate changes.

use std::f64::consts::PI;

use log::debug;
use rustfft::num_complex::Complex64;
use serde::Serialize;

use crate::config::FilterConfig;
use crate::error::{Result, TunerError};

/// Coefficients of a rational transfer function `H(z) = B(z) / A(z)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCoefficients {
    b: Vec<f64>,
    a: Vec<f64>,
}

/// The notch and lowpass stages designed for one sample rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterBank {
    pub sample_rate: u32,
    pub notch: FilterCoefficients,
    pub lowpass: FilterCoefficients,
}

impl FilterCoefficients {
    /// Wraps raw coefficients, normalizing so that `a[0] == 1`.
    ///
    /// # Errors
    /// * `InvalidParameter` - if either sequence is empty or `a[0]` is zero
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Result<Self> {
        if b.is_empty() {
            return Err(TunerError::invalid("feed-forward coefficients", 0.0, "must not be empty"));
        }
        let a0 = match a.first() {
            Some(&a0) if a0 != 0.0 && a0.is_finite() => a0,
            Some(&a0) => {
                return Err(TunerError::invalid("a[0]", a0, "must be finite and non-zero"));
            }
            None => {
                return Err(TunerError::invalid("feedback coefficients", 0.0, "must not be empty"));
            }
        };
        Ok(Self {
            b: b.iter().map(|c| c / a0).collect(),
            a: a.iter().map(|c| c / a0).collect(),
        })
    }

    /// Feed-forward (numerator) coefficients.
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Feedback (denominator) coefficients, `a[0] == 1`.
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Effective order: the longer of the two polynomials, minus one.
    pub fn order(&self) -> usize {
        self.b.len().max(self.a.len()) - 1
    }

    /// Gain at DC, `sum(b) / sum(a)`.
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Linear magnitude `|H(e^{jω})|` at `freq_hz`.
    pub fn magnitude_response(&self, freq_hz: f64, sample_rate: u32) -> f64 {
        let omega = 2.0 * PI * freq_hz / f64::from(sample_rate);
        let z_inv = Complex64::from_polar(1.0, -omega);
        let eval = |coeffs: &[f64]| {
            // Horner's rule in powers of z^-1.
            coeffs
                .iter()
                .rev()
                .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z_inv + c)
        };
        (eval(&self.b) / eval(&self.a)).norm()
    }

    /// Magnitude response in dB. A perfect null is clamped to -300 dB.
    pub fn magnitude_response_db(&self, freq_hz: f64, sample_rate: u32) -> f64 {
        20.0 * self.magnitude_response(freq_hz, sample_rate).max(1e-15).log10()
    }

    /// Samples the magnitude response (dB) at each of `frequencies`.
    pub fn frequency_response(&self, frequencies: &[f64], sample_rate: u32) -> Vec<f64> {
        frequencies
            .iter()
            .map(|&f| self.magnitude_response_db(f, sample_rate))
            .collect()
    }
}

/// Designs both pipeline filters for `sample_rate` from `config`.
///
/// # Errors
/// * `InvalidParameter` - if the sample rate is zero or any frequency is
///   outside `(0, Nyquist)`, the quality factor is not positive, or the
///   order is zero
pub fn design_filters(sample_rate: u32, config: &FilterConfig) -> Result<FilterBank> {
    let notch = design_notch(config.notch_hz, config.notch_q, sample_rate)?;
    let lowpass =
        design_butterworth_lowpass(config.lowpass_cutoff_hz, config.lowpass_order, sample_rate)?;
    debug!(
        "[FILTER] Designed notch {} Hz (Q={}) and order-{} lowpass {} Hz at {} Hz",
        config.notch_hz, config.notch_q, config.lowpass_order, config.lowpass_cutoff_hz, sample_rate
    );
    Ok(FilterBank {
        sample_rate,
        notch,
        lowpass,
    })
}

/// Designs a second-order notch with an exact null at `center_hz`.
///
/// The -3 dB rejection bandwidth is `center_hz / q`.
pub fn design_notch(center_hz: f64, q: f64, sample_rate: u32) -> Result<FilterCoefficients> {
    let w0 = normalized_frequency("notch center", center_hz, sample_rate)?;
    if !(q.is_finite() && q > 0.0) {
        return Err(TunerError::invalid("notch quality factor", q, "must be greater than 0"));
    }

    let bandwidth = PI * w0 / q;
    let w0 = PI * w0;
    // Edges of the rejection band sit at the -3 dB point, which makes the
    // usual sqrt(1 - gb^2) / gb factor equal to one.
    let beta = (bandwidth / 2.0).tan();
    let gain = 1.0 / (1.0 + beta);
    let cos_w0 = w0.cos();

    FilterCoefficients::new(
        vec![gain, -2.0 * gain * cos_w0, gain],
        vec![1.0, -2.0 * gain * cos_w0, 2.0 * gain - 1.0],
    )
}

/// Designs an `order`-th order Butterworth lowpass with a -3 dB point at
/// `cutoff_hz`.
///
/// The analog prototype is pre-warped and mapped with the bilinear
/// transform, which places all zeros at `z = -1` (Nyquist).
pub fn design_butterworth_lowpass(
    cutoff_hz: f64,
    order: usize,
    sample_rate: u32,
) -> Result<FilterCoefficients> {
    let wn = normalized_frequency("lowpass cutoff", cutoff_hz, sample_rate)?;
    if order == 0 {
        return Err(TunerError::invalid("lowpass order", 0.0, "must be at least 1"));
    }

    // Work with a normalized sample rate of 2 so that Nyquist is 1.
    let fs = 2.0;
    let warped = 2.0 * fs * (PI * wn / fs).tan();
    let n = order as f64;

    // Analog prototype poles on the left half of the unit circle, scaled to
    // the warped cutoff.
    let analog_poles: Vec<Complex64> = (0..order)
        .map(|k| {
            let m = (2 * k) as f64 - (n - 1.0);
            -Complex64::from_polar(1.0, PI * m / (2.0 * n)) * warped
        })
        .collect();
    let analog_gain = warped.powi(order as i32);

    let fs2 = Complex64::new(2.0 * fs, 0.0);
    let digital_poles: Vec<Complex64> = analog_poles
        .iter()
        .map(|&p| (fs2 + p) / (fs2 - p))
        .collect();
    let denominator = analog_poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
    let digital_gain = (Complex64::new(analog_gain, 0.0) / denominator).re;

    let zeros = vec![Complex64::new(-1.0, 0.0); order];
    let b = poly(&zeros).iter().map(|c| c.re * digital_gain).collect();
    let a = poly(&digital_poles).iter().map(|c| c.re).collect();

    FilterCoefficients::new(b, a)
}

/// Checks `0 < freq_hz < Nyquist` and returns `freq_hz / Nyquist`.
fn normalized_frequency(name: &'static str, freq_hz: f64, sample_rate: u32) -> Result<f64> {
    if sample_rate == 0 {
        return Err(TunerError::invalid("sample rate", 0.0, "must be greater than 0 Hz"));
    }
    let nyquist = f64::from(sample_rate) / 2.0;
    if !freq_hz.is_finite() || freq_hz <= 0.0 || freq_hz >= nyquist {
        return Err(TunerError::invalid(
            name,
            freq_hz,
            format!("must lie strictly between 0 Hz and Nyquist ({nyquist} Hz)"),
        ));
    }
    Ok(freq_hz / nyquist)
}

/// Expands `prod(z - r)` into polynomial coefficients, highest power first.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = coeffs.clone();
        next.push(Complex64::new(0.0, 0.0));
        for i in 1..next.len() {
            next[i] -= root * coeffs[i - 1];
        }
        coeffs = next;
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected} ± {tol}, got {actual}"
        );
    }

    #[test]
    fn notch_has_a_null_at_its_center() {
        let notch = design_notch(50.0, 30.0, 8_000).unwrap();
        assert_eq!(notch.order(), 2);
        assert!(notch.magnitude_response(50.0, 8_000) < 1e-9);
        assert!(notch.magnitude_response_db(50.0, 8_000) < -100.0);
    }

    #[test]
    fn notch_bandwidth_is_center_over_q() {
        let notch = design_notch(50.0, 30.0, 8_000).unwrap();
        let half_band = 50.0 / 30.0 / 2.0;
        assert_close(notch.magnitude_response_db(50.0 - half_band, 8_000), -3.0, 0.2);
        assert_close(notch.magnitude_response_db(50.0 + half_band, 8_000), -3.0, 0.2);
        assert_close(notch.magnitude_response_db(196.0, 8_000), 0.0, 0.01);
        assert_close(notch.dc_gain(), 1.0, 1e-12);
    }

    #[test]
    fn butterworth_matches_reference_coefficients() {
        // Order 4, cutoff at 1/8 of Nyquist.
        let lowpass = design_butterworth_lowpass(500.0, 4, 8_000).unwrap();
        let b = lowpass.b();
        let a = lowpass.a();
        assert_eq!(b.len(), 5);
        assert_eq!(a.len(), 5);
        assert_close(b[0], 0.000_933_498_612_954_844, 1e-12);
        assert_close(b[2], 0.005_600_991_677_729_065, 1e-12);
        assert_close(a[1], -2.976_844_333_696_732, 1e-9);
        assert_close(a[4], 0.355_577_382_344_409_8, 1e-9);
    }

    #[test]
    fn butterworth_is_flat_then_rolls_off_monotonically() {
        let rate = 8_000;
        let lowpass = design_butterworth_lowpass(500.0, 4, rate).unwrap();
        assert_close(lowpass.dc_gain(), 1.0, 1e-9);
        assert_close(lowpass.magnitude_response_db(500.0, rate), -3.0103, 1e-3);
        assert!(lowpass.magnitude_response_db(196.0, rate) > -0.01);
        assert!(lowpass.magnitude_response_db(2_000.0, rate) < -50.0);

        let freqs: Vec<f64> = (1..80).map(|i| i as f64 * 50.0).collect();
        let response = lowpass.frequency_response(&freqs, rate);
        assert!(response.windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn first_order_butterworth_at_half_nyquist() {
        let lowpass = design_butterworth_lowpass(1_000.0, 1, 4_000).unwrap();
        assert_close(lowpass.b()[0], 0.5, 1e-12);
        assert_close(lowpass.b()[1], 0.5, 1e-12);
        assert_close(lowpass.a()[1], 0.0, 1e-12);
    }

    #[test]
    fn frequencies_must_lie_below_nyquist() {
        let err = design_butterworth_lowpass(500.0, 4, 1_000).unwrap_err();
        assert!(matches!(err, TunerError::InvalidParameter { name: "lowpass cutoff", .. }));

        assert!(design_notch(0.0, 30.0, 8_000).is_err());
        assert!(design_notch(-50.0, 30.0, 8_000).is_err());
        assert!(design_notch(50.0, 0.0, 8_000).is_err());
        assert!(design_notch(50.0, 30.0, 0).is_err());
        assert!(design_butterworth_lowpass(500.0, 0, 8_000).is_err());
    }

    #[test]
    fn design_filters_uses_the_config() {
        let bank = design_filters(44_100, &FilterConfig::default()).unwrap();
        assert_eq!(bank.sample_rate, 44_100);
        assert_eq!(bank.notch.order(), 2);
        assert_eq!(bank.lowpass.order(), 4);
        assert!(bank.notch.magnitude_response(50.0, 44_100) < 1e-9);
    }

    #[test]
    fn coefficients_are_normalized_by_a0() {
        let coeffs = FilterCoefficients::new(vec![2.0, 4.0], vec![2.0, 1.0]).unwrap();
        assert_eq!(coeffs.b(), &[1.0, 2.0]);
        assert_eq!(coeffs.a(), &[1.0, 0.5]);
        assert!(FilterCoefficients::new(vec![1.0], vec![0.0]).is_err());
        assert!(FilterCoefficients::new(vec![], vec![1.0]).is_err());
    }
}
