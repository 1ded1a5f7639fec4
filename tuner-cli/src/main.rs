//! # Guitar Tuner
//!
//! Command-line front end for `tuner-core`: reads a WAV recording of a
//! single plucked string, runs the filter / spectrum / pitch pipeline and
//! prints how far the string is from its target.

mod cli;
mod config;
mod meter;
mod report;
mod wav;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tuner_core::TunerSession;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    if cli.list_strings {
        print!("{}", report::string_table());
        return Ok(());
    }

    let Some(input) = cli.input.as_deref() else {
        bail!("No input file given. Pass a WAV recording, or --list-strings");
    };
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let mut analysis_config = config::resolve_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut analysis_config);
    let target = cli.tuning_target()?;

    log::info!("[AUDIO] Loading {}", input.display());
    let buffer = wav::load_wav(input)?;
    log::info!(
        "[AUDIO] {} samples at {} Hz ({:.2} s)",
        buffer.len(),
        buffer.sample_rate(),
        buffer.duration_secs()
    );

    let mut session = TunerSession::new(analysis_config, target);
    let report = session
        .analyze(&buffer)
        .with_context(|| format!("Analysis of {} failed", input.display()))?;
    log::info!(
        "[ANALYSIS] Detected {:.2} Hz against {:.2} Hz: {}",
        report.tuning.detected_hz,
        report.tuning.target_hz,
        report.tuning.status
    );

    if cli.json {
        println!("{}", report::render_json(input, report)?);
    } else {
        print!("{}", report::render_text(input, report));
    }
    Ok(())
}
