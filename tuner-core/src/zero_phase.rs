//! # Zero-Phase Filtering Module
//!
//! Applies an IIR filter forward and then backward over a whole buffer so
//! that the phase shifts of the two passes cancel. The magnitude response
//! is applied twice (squared) and the output has no group delay, which
//! keeps the plucked transient aligned with the raw recording.
//!
//! Edges are handled by extending the signal with an odd reflection of
//! `3 * (order + 1)` samples on each side and starting each pass from the
//! filter's steady state, which suppresses start-up transients.

use log::trace;

use crate::audio::AudioBuffer;
use crate::error::{Result, TunerError};
use crate::filter::{FilterBank, FilterCoefficients};

/// Number of samples reflected onto each edge for `coeffs`.
pub fn pad_length(coeffs: &FilterCoefficients) -> usize {
    3 * coeffs.b().len().max(coeffs.a().len())
}

/// Smallest buffer length [`filtfilt`] accepts for `coeffs`.
pub fn min_samples(coeffs: &FilterCoefficients) -> usize {
    pad_length(coeffs) + 1
}

/// Filters `signal` forward and backward with `coeffs`.
///
/// # Errors
/// * `InsufficientSamples` - if `signal` is not longer than the edge padding
pub fn filtfilt(coeffs: &FilterCoefficients, signal: &[f64]) -> Result<Vec<f64>> {
    let pad = pad_length(coeffs);
    if signal.len() <= pad {
        return Err(TunerError::InsufficientSamples {
            required: pad + 1,
            actual: signal.len(),
        });
    }

    let extended = odd_extension(signal, pad);
    let zi = steady_state(coeffs);

    let forward = lfilter(coeffs, &extended, &scaled(&zi, extended[0]));
    let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
    let first = reversed[0];
    reversed = lfilter(coeffs, &reversed, &scaled(&zi, first));
    reversed.reverse();

    Ok(reversed[pad..reversed.len() - pad].to_vec())
}

/// Runs the notch stage, then the lowpass stage, over `buffer`.
///
/// The input is left untouched; a new buffer of the same length and sample
/// rate is returned.
pub fn apply_filter_bank(bank: &FilterBank, buffer: &AudioBuffer) -> Result<AudioBuffer> {
    trace!(
        "[FILTER] Zero-phase filtering {} samples at {} Hz",
        buffer.len(),
        buffer.sample_rate()
    );
    let notched = filtfilt(&bank.notch, buffer.samples())?;
    let smoothed = filtfilt(&bank.lowpass, &notched)?;
    Ok(buffer.with_samples(smoothed))
}

/// Direct-form II transposed IIR filter with initial state `zi`.
///
/// `zi` must hold `order` values, where `order` is the effective filter
/// order; shorter coefficient lists are zero-padded.
pub fn lfilter(coeffs: &FilterCoefficients, input: &[f64], zi: &[f64]) -> Vec<f64> {
    let (b, a) = padded(coeffs);
    let order = b.len() - 1;
    let mut state = zi.to_vec();
    state.resize(order, 0.0);

    input
        .iter()
        .map(|&x| {
            let y = b[0] * x + state.first().copied().unwrap_or(0.0);
            for i in 0..order {
                let next = if i + 1 < order { state[i + 1] } else { 0.0 };
                state[i] = b[i + 1] * x - a[i + 1] * y + next;
            }
            y
        })
        .collect()
}

/// Filter state after an infinitely long unit step, i.e. the state from
/// which a constant input produces a constant output.
///
/// With `g = sum(b) / sum(a)` the DC gain, state `i` is
/// `sum_{k > i} (b[k] - a[k] * g)`.
pub fn steady_state(coeffs: &FilterCoefficients) -> Vec<f64> {
    let (b, a) = padded(coeffs);
    let order = b.len() - 1;
    let a_sum: f64 = a.iter().sum();
    let gain = if a_sum.abs() > f64::EPSILON {
        b.iter().sum::<f64>() / a_sum
    } else {
        0.0
    };

    let mut zi = vec![0.0; order];
    let mut acc = 0.0;
    for i in (0..order).rev() {
        acc += b[i + 1] - a[i + 1] * gain;
        zi[i] = acc;
    }
    zi
}

fn padded(coeffs: &FilterCoefficients) -> (Vec<f64>, Vec<f64>) {
    let len = coeffs.b().len().max(coeffs.a().len());
    let mut b = coeffs.b().to_vec();
    let mut a = coeffs.a().to_vec();
    b.resize(len, 0.0);
    a.resize(len, 0.0);
    (b, a)
}

fn scaled(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}

/// Extends `signal` by `pad` samples on both ends with a point reflection
/// about the edge samples. Requires `signal.len() > pad`.
fn odd_extension(signal: &[f64], pad: usize) -> Vec<f64> {
    let n = signal.len();
    let first = signal[0];
    let last = signal[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
    extended.extend_from_slice(signal);
    extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));
    extended
}
