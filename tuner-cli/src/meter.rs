//! # Tuning Meter
//!
//! Text rendition of a needle meter for the terminal. The scale spans
//! ±10 Hz around the target with FLAT / IN TUNE / SHARP zones, and the
//! needle is clamped to the scale ends.

/// Hz deviation at which the needle reaches the end of the scale.
const METER_RANGE_HZ: f64 = 10.0;

/// Characters between the brackets; odd so that there is a centre cell.
const METER_WIDTH: usize = 41;

/// Share of the scale taken by each outer (flat / sharp) zone.
const OUTER_ZONE: f64 = 0.35;

pub struct TuningMeter {
    difference_hz: f64,
}

impl TuningMeter {
    pub fn new(difference_hz: f64) -> Self {
        Self { difference_hz }
    }

    /// Column of the needle within the scale, 0-based.
    pub fn needle_position(&self) -> usize {
        let center = (METER_WIDTH / 2) as f64;
        let deflection = (self.difference_hz / METER_RANGE_HZ).clamp(-1.0, 1.0);
        (center + deflection * center * 0.9).round() as usize
    }

    /// Renders three lines: zone labels, the scale, and the needle.
    pub fn render(&self) -> String {
        let outer = (METER_WIDTH as f64 * OUTER_ZONE).round() as usize;
        let center = METER_WIDTH / 2;

        let scale: String = (0..METER_WIDTH)
            .map(|i| {
                if i == center {
                    '|'
                } else if i < outer || i >= METER_WIDTH - outer {
                    '-'
                } else {
                    '='
                }
            })
            .collect();

        let inner = "IN TUNE";
        let gap = METER_WIDTH.saturating_sub("FLAT".len() + inner.len() + "SHARP".len()) / 2;
        let labels = format!(" FLAT{:gap$}{inner}{:gap$}SHARP", "", "");

        let needle = format!(" {:pad$}^", "", pad = self.needle_position());
        format!("{labels}\n[{scale}]\n{needle}")
    }
}
