//! Configuration file loading.

use crate::error::ConfigError;
use crate::types::StrataConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Loads `strata.toml` from `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<StrataConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse(&content, path.display().to_string())
}

/// Parses configuration text that did not come from a file.
pub fn load_config_from_str(content: &str) -> Result<StrataConfig, ConfigError> {
    parse(content, "<string>".to_string())
}

fn parse(content: &str, origin: String) -> Result<StrataConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse { origin, source })
}
