//! # Tuner Session
//!
//! Caller-owned context for repeated analyses: it keeps the active
//! configuration and the last successful report. A failed run records its
//! error but leaves the previous report in place, so a front end can keep
//! showing the last known good reading next to the new failure.

use log::debug;

use crate::analysis::{analyze, analyze_nearest_string, AnalysisReport};
use crate::audio::AudioBuffer;
use crate::config::AnalysisConfig;
use crate::error::{Result, TunerError};
use crate::tuning::GuitarString;

/// What the next analysis should be compared against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuningTarget {
    /// A string from the standard-tuning table.
    String(GuitarString),
    /// An arbitrary reference frequency in Hz.
    Frequency(f64),
    /// Whichever string is nearest to the detected pitch.
    Nearest,
}

impl Default for TuningTarget {
    fn default() -> Self {
        TuningTarget::String(GuitarString::E4)
    }
}

/// State carried between analysis runs.
#[derive(Debug, Clone, Default)]
pub struct TunerSession {
    config: AnalysisConfig,
    target: TuningTarget,
    last_report: Option<AnalysisReport>,
    last_error: Option<TunerError>,
    runs: usize,
}

impl TunerSession {
    pub fn new(config: AnalysisConfig, target: TuningTarget) -> Self {
        Self {
            config,
            target,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replaces the configuration used by subsequent runs.
    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }

    pub fn target(&self) -> TuningTarget {
        self.target
    }

    pub fn set_target(&mut self, target: TuningTarget) {
        self.target = target;
    }

    /// Analyzes `buffer` against the session's target.
    ///
    /// On success the report replaces the previous one and the last error is
    /// cleared. On failure the error is recorded and returned, and the
    /// previous report is kept.
    pub fn analyze(&mut self, buffer: &AudioBuffer) -> Result<&AnalysisReport> {
        self.runs += 1;
        let outcome = match self.target {
            TuningTarget::String(string) => analyze(buffer, string.frequency(), &self.config),
            TuningTarget::Frequency(hz) => analyze(buffer, hz, &self.config),
            TuningTarget::Nearest => analyze_nearest_string(buffer, &self.config),
        };

        match outcome {
            Ok(report) => {
                debug!("[SESSION] Run {} succeeded", self.runs);
                self.last_error = None;
                Ok(&*self.last_report.insert(report))
            }
            Err(err) => {
                debug!("[SESSION] Run {} failed: {}", self.runs, err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// The most recent successful report, if any.
    pub fn last_report(&self) -> Option<&AnalysisReport> {
        self.last_report.as_ref()
    }

    /// The error of the most recent run, if it failed.
    pub fn last_error(&self) -> Option<&TunerError> {
        self.last_error.as_ref()
    }

    /// Number of analyses attempted, successful or not.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Forgets the stored report and error.
    pub fn clear(&mut self) {
        self.last_report = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::TuningStatus;
    use std::f64::consts::PI;

    fn tone(freq: f64, rate: u32) -> AudioBuffer {
        let samples = (0..rate as usize)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f64 / f64::from(rate)).sin())
            .collect();
        AudioBuffer::new(samples, rate).unwrap()
    }

    #[test]
    fn failure_keeps_the_last_good_report() {
        let mut session = TunerSession::new(
            AnalysisConfig::default(),
            TuningTarget::String(GuitarString::A2),
        );

        let first = session.analyze(&tone(110.0, 8_000)).unwrap().tuning;
        assert_eq!(first.status, TuningStatus::InTune);

        let silence = AudioBuffer::new(vec![0.0; 8_000], 8_000).unwrap();
        assert!(session.analyze(&silence).is_err());

        assert_eq!(session.last_report().unwrap().tuning, first);
        assert!(matches!(
            session.last_error(),
            Some(TunerError::NoFrequencyInRange { .. })
        ));
        assert_eq!(session.runs(), 2);
    }

    #[test]
    fn success_clears_the_previous_error() {
        let mut session = TunerSession::new(AnalysisConfig::default(), TuningTarget::Frequency(150.0));
        let short = AudioBuffer::new(vec![0.0; 4], 8_000).unwrap();
        assert!(session.analyze(&short).is_err());
        assert!(session.last_report().is_none());

        let report = session.analyze(&tone(146.0, 8_000)).unwrap();
        assert_eq!(report.tuning.status, TuningStatus::Flat);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn target_and_config_can_change_between_runs() {
        let mut session = TunerSession::default();
        assert_eq!(session.target(), TuningTarget::String(GuitarString::E4));

        session.set_target(TuningTarget::Nearest);
        let mut config = AnalysisConfig::default();
        config.tolerance_hz = 0.5;
        session.set_config(config);

        let report = session.analyze(&tone(247.0, 8_000)).unwrap();
        assert_eq!(report.target_string, Some(GuitarString::B3));
        assert_eq!(report.tuning.tolerance_hz, 0.5);

        session.clear();
        assert!(session.last_report().is_none());
    }
}
