//! Configuration validation.
//!
//! Every section is checked and all problems are collected into a single
//! `ConfigError::ValidationError`.

mod helpers;
mod sections;


use crate::schema::WeftConfig;
use weft_common::ConfigError;

pub fn validate(config: &WeftConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_event_loop(&mut errors, config);
    sections::validate_window(&mut errors, config);
    sections::validate_webview(&mut errors, config);
    sections::validate_ipc(&mut errors, config);
    sections::validate_render(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
