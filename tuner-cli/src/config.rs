use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tuner_core::AnalysisConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "tuner.toml";

/// Loads the analysis config: the explicit path if given, else
/// `./tuner.toml` if it exists, else the built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AnalysisConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.exists().then_some(local)
        }
    };

    match path {
        Some(path) => {
            let config = load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Parses TOML; omitted keys keep their defaults.
pub fn parse_config(content: &str) -> Result<AnalysisConfig> {
    Ok(toml::from_str(content)?)
}
