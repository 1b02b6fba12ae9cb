//! # Config Loading
//!
//! Resolves the effective [`CollectorConfig`]: compiled-in defaults, then
//! an optional TOML file, then CLI overrides. The result is validated
//! before any session is built from it.
//!
//! ```toml
//! data_dir = "precognition_data"
//! output_file = "action_sequences.jsonl"
//! write_trigger = 50
//! ```

use precog_core::{CollectorConfig, PrecogError};
use std::path::{Path, PathBuf};

/// Maximum accepted config file size (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Load a config file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<CollectorConfig, PrecogError> {
    let Some(path) = path else {
        return Ok(CollectorConfig::default());
    };

    let metadata = std::fs::metadata(path).map_err(|e| {
        PrecogError::InvalidConfig(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(PrecogError::InvalidConfig(format!(
            "Config file {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        PrecogError::InvalidConfig(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    toml::from_str(&text)
        .map_err(|e| PrecogError::InvalidConfig(format!("{}: {}", path.display(), e)))
}

/// Parse TOML config text. Unknown keys are rejected.
pub fn parse_config(text: &str) -> Result<CollectorConfig, PrecogError> {
    toml::from_str(text).map_err(|e| PrecogError::InvalidConfig(e.to_string()))
}

/// Apply CLI overrides and validate.
pub fn resolve_config(
    mut config: CollectorConfig,
    data_dir: Option<PathBuf>,
    output_file: Option<String>,
) -> Result<CollectorConfig, PrecogError> {
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(file) = output_file {
        config.output_file = file;
    }
    config.validate()?;
    Ok(config)
}
