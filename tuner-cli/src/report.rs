//! # Report Rendering
//!
//! Turns an [`AnalysisReport`] into the text printed on the terminal, or
//! into the JSON document written with `--json`.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use tuner_core::{AnalysisReport, SignalStats, TuningStatus, STANDARD_TUNING};

use crate::meter::TuningMeter;

/// JSON output: the source file alongside the serialised report.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub input: &'a Path,
    pub sample_rate: u32,
    #[serde(flatten)]
    pub report: &'a AnalysisReport,
}

pub fn render_json(input: &Path, report: &AnalysisReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        input,
        sample_rate: report.filtered.sample_rate(),
        report,
    })
}

pub fn render_text(input: &Path, report: &AnalysisReport) -> String {
    let tuning = &report.tuning;
    let mut out = String::new();

    let _ = writeln!(out, "Recording: {}", input.display());
    push_stats(&mut out, "Raw signal", &report.raw_stats);
    push_stats(&mut out, "Filtered signal", &report.filtered_stats);
    let _ = writeln!(out);

    match report.target_string {
        Some(string) => {
            let _ = writeln!(out, "Target:    {} at {:.2} Hz", string.label(), tuning.target_hz);
        }
        None => {
            let _ = writeln!(out, "Target:    {:.2} Hz", tuning.target_hz);
        }
    }
    let _ = writeln!(
        out,
        "Detected:  {:.2} Hz (resolution {:.2} Hz)",
        tuning.detected_hz, report.resolution_hz
    );
    let _ = writeln!(
        out,
        "Offset:    {:+.2} Hz ({:+.1} cents), tolerance ±{:.2} Hz",
        tuning.difference_hz, tuning.cents, tuning.tolerance_hz
    );
    let _ = writeln!(out, "Status:    {}", tuning.status);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", TuningMeter::new(tuning.difference_hz).render());
    let _ = writeln!(out);

    match tuning.status {
        TuningStatus::InTune => {
            let _ = writeln!(out, "{}", tuning.status.instruction());
        }
        _ => {
            let _ = writeln!(out, "{}", tuning.status.instruction());
            let _ = writeln!(out, "Adjust by about {:.2} Hz", tuning.difference_hz.abs());
        }
    }

    let fx = &report.effectiveness;
    let _ = writeln!(out);
    let _ = writeln!(out, "Filter effectiveness:");
    let _ = writeln!(out, "  Noise reduction:  {:.1}%", fx.noise_reduction_percent);
    let _ = writeln!(out, "  SNR improvement:  {:.2} dB", fx.snr_improvement_db);
    let _ = writeln!(out, "  Peak clarity:     {:.2}x", fx.clarity_gain);
    out
}

fn push_stats(out: &mut String, title: &str, stats: &SignalStats) {
    let _ = writeln!(
        out,
        "{title}: {:.2} s, max {:.4}, rms {:.4}, std {:.4}, peak-to-peak {:.4}",
        stats.duration_secs, stats.max_amplitude, stats.rms, stats.std_dev, stats.peak_to_peak
    );
}

/// Table printed by `--list-strings`.
pub fn string_table() -> String {
    let mut out = String::from("Standard tuning:\n");
    for string in STANDARD_TUNING {
        let _ = writeln!(out, "  {:<20} {:>7.2} Hz", string.label(), string.frequency());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use tuner_core::{analyze, analyze_string, AnalysisConfig, AudioBuffer, GuitarString};

    fn tone(freq: f64) -> AudioBuffer {
        let rate = 8_000;
        let samples = (0..rate)
            .map(|i| 0.5 * (2.0 * PI * freq * f64::from(i) / f64::from(rate)).sin())
            .collect();
        AudioBuffer::new(samples, rate).unwrap()
    }

    #[test]
    fn text_report_names_the_string_and_status() {
        let report =
            analyze_string(&tone(110.0), GuitarString::A2, &AnalysisConfig::default()).unwrap();
        let text = render_text(Path::new("a.wav"), &report);

        assert!(text.contains("A2 (5th)"));
        assert!(text.contains("Detected:  110.00 Hz"));
        assert!(text.contains("Status:    IN TUNE"));
        assert!(text.contains("Noise reduction"));
    }

    #[test]
    fn text_report_gives_a_direction_when_out_of_tune() {
        let report = analyze(&tone(150.0), 146.83 - 5.0, &AnalysisConfig::default()).unwrap();
        let text = render_text(Path::new("d.wav"), &report);

        assert!(text.contains("Target:    141.83 Hz"));
        assert!(text.contains("Status:    SHARP"));
        assert!(text.contains(TuningStatus::Sharp.instruction()));
    }

    #[test]
    fn json_report_carries_the_input_and_rate() {
        let report =
            analyze_string(&tone(196.0), GuitarString::G3, &AnalysisConfig::default()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&render_json(Path::new("g.wav"), &report).unwrap()).unwrap();

        assert_eq!(json["input"], "g.wav");
        assert_eq!(json["sample_rate"], 8_000);
        assert_eq!(json["target_string"], "G3");
        assert_eq!(json["tuning"]["status"], "IN_TUNE");
    }

    #[test]
    fn string_table_lists_all_six() {
        let table = string_table();
        assert_eq!(table.lines().count(), 7);
        assert!(table.contains("82.41 Hz") && table.contains("329.63 Hz"));
    }
}
