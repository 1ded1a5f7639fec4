use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tuner_core::tuning::find_string;
use tuner_core::{AnalysisConfig, TuningTarget, STANDARD_TUNING};

#[derive(Parser, Debug)]
#[command(
    name = "guitar-tuner",
    version,
    about = "Detects the pitch of a plucked guitar string in a WAV recording and compares it with standard tuning"
)]
pub struct Cli {
    /// Input WAV file (PCM or float; channels are mixed down to mono)
    pub input: Option<PathBuf>,

    /// String to tune: E2 A2 D3 G3 B3 E4, a string number (6-1), low-e, high-e, or "auto"
    #[arg(short, long, default_value = "E4")]
    pub string: String,

    /// Custom target frequency in Hz. Takes precedence over --string.
    #[arg(short, long)]
    pub target: Option<f64>,

    /// In-tune tolerance in Hz
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Mains frequency removed by the notch filter (50 or 60 Hz)
    #[arg(long)]
    pub notch_hz: Option<f64>,

    /// Notch quality factor (higher = narrower)
    #[arg(long)]
    pub notch_q: Option<f64>,

    /// Lowpass cutoff in Hz
    #[arg(long)]
    pub cutoff_hz: Option<f64>,

    /// Lowpass filter order
    #[arg(long)]
    pub order: Option<usize>,

    /// Lower edge of the pitch detection band in Hz
    #[arg(long)]
    pub band_min: Option<f64>,

    /// Upper edge of the pitch detection band in Hz
    #[arg(long)]
    pub band_max: Option<f64>,

    /// Analysis config file (TOML). Defaults to ./tuner.toml when present.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// List the standard-tuning strings and exit
    #[arg(long)]
    pub list_strings: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Resolves `--target` / `--string` into what the session tunes against.
    pub fn tuning_target(&self) -> Result<TuningTarget> {
        if let Some(hz) = self.target {
            if !(hz.is_finite() && hz > 0.0) {
                bail!("Target frequency must be a positive number of Hz, got {hz}");
            }
            return Ok(TuningTarget::Frequency(hz));
        }
        if self.string.trim().eq_ignore_ascii_case("auto") {
            return Ok(TuningTarget::Nearest);
        }
        match find_string(&self.string) {
            Some(string) => Ok(TuningTarget::String(string)),
            None => {
                let names: Vec<&str> = STANDARD_TUNING.iter().map(|s| s.name()).collect();
                bail!(
                    "Unknown string '{}'. Expected one of {}, a string number, or auto",
                    self.string,
                    names.join(", ")
                )
            }
        }
    }

    /// Command-line values win over the config file.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(v) = self.tolerance {
            config.tolerance_hz = v;
        }
        if let Some(v) = self.notch_hz {
            config.filter.notch_hz = v;
        }
        if let Some(v) = self.notch_q {
            config.filter.notch_q = v;
        }
        if let Some(v) = self.cutoff_hz {
            config.filter.lowpass_cutoff_hz = v;
        }
        if let Some(v) = self.order {
            config.filter.lowpass_order = v;
        }
        if let Some(v) = self.band_min {
            config.detection.min_hz = v;
        }
        if let Some(v) = self.band_max {
            config.detection.max_hz = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuner_core::GuitarString;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("guitar-tuner").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_the_high_e_string() {
        let cli = parse(&["take.wav"]);
        assert_eq!(cli.input, Some(PathBuf::from("take.wav")));
        assert_eq!(cli.tuning_target().unwrap(), TuningTarget::String(GuitarString::E4));
        assert!(!cli.json);
    }

    #[test]
    fn string_selection() {
        assert_eq!(
            parse(&["-s", "low-e", "x.wav"]).tuning_target().unwrap(),
            TuningTarget::String(GuitarString::E2)
        );
        assert_eq!(
            parse(&["--string", "AUTO", "x.wav"]).tuning_target().unwrap(),
            TuningTarget::Nearest
        );
        assert!(parse(&["--string", "C4", "x.wav"]).tuning_target().is_err());
    }

    #[test]
    fn explicit_target_wins() {
        let cli = parse(&["--string", "A2", "--target", "432", "x.wav"]);
        assert_eq!(cli.tuning_target().unwrap(), TuningTarget::Frequency(432.0));
        assert!(parse(&["--target", "0", "x.wav"]).tuning_target().is_err());
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = parse(&[
            "--notch-hz", "60", "--order", "6", "--band-max", "350", "--tolerance", "1.5", "x.wav",
        ]);
        let mut config = AnalysisConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.filter.notch_hz, 60.0);
        assert_eq!(config.filter.notch_q, 30.0);
        assert_eq!(config.filter.lowpass_order, 6);
        assert_eq!(config.detection.max_hz, 350.0);
        assert_eq!(config.detection.min_hz, 70.0);
        assert_eq!(config.tolerance_hz, 1.5);
    }
}
