//! Configuration validation utilities.

use std::collections::HashSet;

use rester_router::RouterConfig;

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, ResterConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ResterConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_router_config(&config.router)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        let Some(path) = &logging.file_path else {
            return Err(ConfigError::missing_field("logging.file_path"));
        };
        if path.file_name().is_none() {
            return Err(ConfigError::validation(format!(
                "Log file path must name a file: {}",
                path.display()
            )));
        }
        if logging.max_files == 0 {
            return Err(ConfigError::validation(
                "logging.max_files must be greater than 0",
            ));
        }
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Empty module name in logging.filters: {module:?}"
        )));
    }

    Ok(())
}

fn validate_router_config(router: &RouterConfig) -> ConfigResult<()> {
    if router.methods.is_empty() {
        return Err(ConfigError::validation(
            "router.methods must list at least one HTTP method",
        ));
    }

    let mut seen = HashSet::new();
    for method in &router.methods {
        if !seen.insert(method) {
            return Err(ConfigError::DuplicateMethod(*method));
        }
    }

    Ok(())
}
