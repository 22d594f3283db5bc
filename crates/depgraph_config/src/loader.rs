//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::DepGraphConfig;
use std::path::Path;
use tracing::debug;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "depgraph.toml";

/// Loads and validates `<project_dir>/depgraph.toml`.
pub fn load_config(project_dir: &Path) -> Result<DepGraphConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but returns the defaults when the file does not exist.
///
/// Any other read, parse, or validation failure is still an error.
pub fn load_config_or_default(project_dir: &Path) -> Result<DepGraphConfig, ConfigError> {
    match load_config(project_dir) {
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %project_dir.display(), "no {CONFIG_FILE}, using defaults");
            Ok(DepGraphConfig::default())
        }
        other => other,
    }
}

/// Parses and validates a `depgraph.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<DepGraphConfig, ConfigError> {
    let config: DepGraphConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &DepGraphConfig) -> Result<(), ConfigError> {
    if config.store.dir.is_empty() {
        return Err(ConfigError::MissingField("store.dir".to_string()));
    }
    if config.store.tool_version.is_empty() {
        return Err(ConfigError::MissingField("store.tool_version".to_string()));
    }
    if config.diff.parallel_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "diff.parallel_threshold must be at least 1".to_string(),
        ));
    }
    Ok(())
}
