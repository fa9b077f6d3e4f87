//! Read a config from a path or from the platform default location.

use crate::schema::WeftConfig;
use crate::validation;
use std::path::Path;
use tracing::{info, warn};
use weft_common::ConfigError;

use super::paths::{create_default_config, default_config_path};

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. Validation problems are
/// logged and the parsed config is returned unchanged; callers that need
/// a hard failure run [`validation::validate`] themselves.
pub fn load_from_path(path: &Path) -> Result<WeftConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;

    let config: WeftConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), error = %e, "config has invalid values");
    }

    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load config from the platform default path, writing the commented
/// template there first if no file exists yet.
///
/// On macOS: `~/Library/Application Support/weft/config.toml`
/// On Linux: `~/.config/weft/config.toml`
pub fn load_default() -> Result<WeftConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "no config found, creating default");
            create_default_config(&path)?;
            Ok(WeftConfig::default())
        }
        Err(e) => Err(e),
    }
}
