//! weft configuration.
//!
//! TOML-based configuration with validation. Every section has defaults so
//! partial files work out of the box.
//!
//! ```rust,no_run
//! use weft_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{WeftConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;
use weft_common::ConfigError;

/// Load and validate config from the platform default path, creating the
/// file from the template if none exists.
pub fn load_config() -> Result<WeftConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load and validate config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<WeftConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

pub fn config_to_json(config: &WeftConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
