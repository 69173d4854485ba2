//! Engine configuration.
//!
//! ```ini
//! [engine]
//! rules_path = market_rules.metta
//!
//! [logging]
//! filter = contrarian=info
//! json = false
//! ```

use crate::domain::error::ContrarianError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "contrarian=info";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub rules_path: Option<PathBuf>,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
        }
    }
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, ContrarianError> {
    validate_engine_config(config)?;

    let rules_path = config.get_path("engine", "rules_path");
    let log_filter = config
        .get_string("logging", "filter")
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    Ok(EngineConfig {
        rules_path,
        log_filter,
        log_json: config.get_bool("logging", "json", false),
    })
}

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), ContrarianError> {
    validate_not_blank(config, "engine", "rules_path")?;
    validate_not_blank(config, "logging", "filter")?;
    validate_bool(config, "logging", "json")?;
    Ok(())
}

fn validate_not_blank(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), ContrarianError> {
    match config.get_string(section, key) {
        Some(value) if value.trim().is_empty() => Err(ContrarianError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must not be empty when present", key),
        }),
        _ => Ok(()),
    }
}

fn validate_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), ContrarianError> {
    let Some(value) = config.get_string(section, key) else {
        return Ok(());
    };
    // Both defaults disagree only when the value is not a recognised boolean.
    if config.get_bool(section, key, true) != config.get_bool(section, key, false) {
        return Err(ContrarianError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected a boolean, found '{}'", value),
        });
    }
    Ok(())
}
