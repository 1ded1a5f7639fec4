//! # Musical Tuning Module
//!
//! This module holds the standard guitar tuning table and the logic that
//! turns a detected frequency into a tuning verdict.
//!
//! ## Features
//! - Six-string standard tuning (E2 A2 D3 G3 B3 E4)
//! - String lookup by note name, string number or nickname
//! - Nearest-string search for automatic target selection
//! - Cent deviation and in-tune / sharp / flat classification

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::validate_tolerance;
use crate::error::Result;

/// One open string of a six-string guitar in standard tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuitarString {
    E2,
    A2,
    D3,
    G3,
    B3,
    E4,
}

/// All strings from lowest (6th) to highest (1st).
pub const STANDARD_TUNING: [GuitarString; 6] = [
    GuitarString::E2,
    GuitarString::A2,
    GuitarString::D3,
    GuitarString::G3,
    GuitarString::B3,
    GuitarString::E4,
];

impl GuitarString {
    /// Reference frequency in Hz.
    pub fn frequency(self) -> f64 {
        match self {
            GuitarString::E2 => 82.41,
            GuitarString::A2 => 110.00,
            GuitarString::D3 => 146.83,
            GuitarString::G3 => 196.00,
            GuitarString::B3 => 246.94,
            GuitarString::E4 => 329.63,
        }
    }

    /// Note name, e.g. "E2".
    pub fn name(self) -> &'static str {
        match self {
            GuitarString::E2 => "E2",
            GuitarString::A2 => "A2",
            GuitarString::D3 => "D3",
            GuitarString::G3 => "G3",
            GuitarString::B3 => "B3",
            GuitarString::E4 => "E4",
        }
    }

    /// String number as guitarists count them: 6 is the low E.
    pub fn number(self) -> u8 {
        match self {
            GuitarString::E2 => 6,
            GuitarString::A2 => 5,
            GuitarString::D3 => 4,
            GuitarString::G3 => 3,
            GuitarString::B3 => 2,
            GuitarString::E4 => 1,
        }
    }

    /// Display label, e.g. "E2 (6th - Low E)".
    pub fn label(self) -> &'static str {
        match self {
            GuitarString::E2 => "E2 (6th - Low E)",
            GuitarString::A2 => "A2 (5th)",
            GuitarString::D3 => "D3 (4th)",
            GuitarString::G3 => "G3 (3rd)",
            GuitarString::B3 => "B3 (2nd)",
            GuitarString::E4 => "E4 (1st - High E)",
        }
    }
}

impl fmt::Display for GuitarString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static map for case-insensitive string lookups.
///
/// Every string is reachable by note name ("e2"), string number ("6") and
/// the two E strings also by nickname ("low-e", "high-e").
static STRING_MAP: Lazy<BTreeMap<String, GuitarString>> = Lazy::new(|| {
    let mut map: BTreeMap<String, GuitarString> = STANDARD_TUNING
        .iter()
        .flat_map(|&s| {
            [
                (s.name().to_ascii_lowercase(), s),
                (s.number().to_string(), s),
            ]
        })
        .collect();
    for (alias, s) in [
        ("low-e", GuitarString::E2),
        ("low e", GuitarString::E2),
        ("high-e", GuitarString::E4),
        ("high e", GuitarString::E4),
    ] {
        map.insert(alias.to_string(), s);
    }
    map
});

/// Looks up a string by name, number or nickname, ignoring case and
/// surrounding whitespace.
pub fn find_string(name: &str) -> Option<GuitarString> {
    STRING_MAP.get(&name.trim().to_ascii_lowercase()).copied()
}

/// Finds the string whose reference frequency is closest to `freq`.
pub fn nearest_string(freq: f64) -> GuitarString {
    STANDARD_TUNING
        .iter()
        .copied()
        .min_by(|a, b| {
            let diff_a = (a.frequency() - freq).abs();
            let diff_b = (b.frequency() - freq).abs();
            diff_a
                .partial_cmp(&diff_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(GuitarString::E2)
}

/// Tuning verdict for one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TuningStatus {
    InTune,
    Sharp,
    Flat,
}

impl TuningStatus {
    /// Classifies a signed difference (detected - target) against a
    /// tolerance. The tolerance boundary itself counts as in tune.
    pub fn classify(difference_hz: f64, tolerance_hz: f64) -> Self {
        if difference_hz.abs() <= tolerance_hz {
            TuningStatus::InTune
        } else if difference_hz > tolerance_hz {
            TuningStatus::Sharp
        } else {
            TuningStatus::Flat
        }
    }

    /// What the player should do with the tuning peg.
    pub fn instruction(self) -> &'static str {
        match self {
            TuningStatus::InTune => "Perfect! Your string is in tune.",
            TuningStatus::Sharp => {
                "String is SHARP - loosen the tuning peg (turn counter-clockwise)"
            }
            TuningStatus::Flat => "String is FLAT - tighten the tuning peg (turn clockwise)",
        }
    }
}

impl fmt::Display for TuningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TuningStatus::InTune => "IN TUNE",
            TuningStatus::Sharp => "SHARP",
            TuningStatus::Flat => "FLAT",
        })
    }
}

/// How a detected frequency compares to its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuningResult {
    pub detected_hz: f64,
    pub target_hz: f64,
    /// `detected_hz - target_hz`.
    pub difference_hz: f64,
    pub cents: f64,
    pub status: TuningStatus,
    pub tolerance_hz: f64,
}

/// Compares `detected_hz` to `target_hz`.
///
/// # Errors
/// * `InvalidParameter` - if `tolerance_hz` is not a positive number
pub fn evaluate(detected_hz: f64, target_hz: f64, tolerance_hz: f64) -> Result<TuningResult> {
    validate_tolerance(tolerance_hz)?;

    let difference_hz = detected_hz - target_hz;
    Ok(TuningResult {
        detected_hz,
        target_hz,
        difference_hz,
        cents: calculate_cents_deviation(detected_hz, target_hz),
        status: TuningStatus::classify(difference_hz, tolerance_hz),
        tolerance_hz,
    })
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// A non-positive frequency on either side returns 0 instead of failing.
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    if freq <= 0.0 || target_freq <= 0.0 {
        return 0.0;
    }
    1200.0 * (freq / target_freq).log2()
}
