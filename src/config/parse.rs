use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars, expand_tilde};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(e) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        )),
        other => other,
    })
}

/// Parse and validate a config from its YAML text.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}",
        unexpanded_vars.join(", ")
    )))
}

fn expand_paths(config: &mut Config) {
    match &mut config.source {
        SourceConfig::File { path } => *path = expand_tilde(path),
        SourceConfig::Journal { journalctl, .. } => *journalctl = expand_tilde(journalctl),
        SourceConfig::Stdin => {}
    }

    if let DeliveryConfig::Command { program, .. } = &mut config.delivery {
        *program = expand_tilde(program);
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.recipient.trim().is_empty() {
        errors.push("recipient must not be empty".to_string());
    }

    if config.min_priority > 7 {
        errors.push(format!(
            "min_priority must be between 0 and 7, got {}",
            config.min_priority
        ));
    }

    if config.default_priority > 7 {
        errors.push(format!(
            "default_priority must be between 0 and 7, got {}",
            config.default_priority
        ));
    }

    if config.pipeline.tick_interval.is_zero() {
        errors.push("pipeline.tick_interval must be greater than zero".to_string());
    }

    if config.pipeline.max_line_bytes == 0 {
        errors.push("pipeline.max_line_bytes must be greater than zero".to_string());
    }

    validate_source(&config.source, &mut errors);
    validate_delivery(&config.delivery, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

fn validate_source(source: &SourceConfig, errors: &mut Vec<String>) {
    match source {
        SourceConfig::Journal { journalctl, .. } if journalctl.as_os_str().is_empty() => {
            errors.push("source.journalctl must not be empty".to_string());
        }
        SourceConfig::File { path } if path.as_os_str().is_empty() => {
            errors.push("source.path must not be empty".to_string());
        }
        _ => {}
    }
}

fn validate_delivery(delivery: &DeliveryConfig, errors: &mut Vec<String>) {
    match delivery {
        DeliveryConfig::Command {
            program, timeout, ..
        } => {
            if program.as_os_str().is_empty() {
                errors.push("delivery.program must not be empty".to_string());
            }
            if timeout.is_zero() {
                errors.push("delivery.timeout must be greater than zero".to_string());
            }
        }
        DeliveryConfig::Webhook { url, timeout } => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!(
                    "delivery.url must be an http(s) URL, got '{}'",
                    url
                ));
            }
            if timeout.is_zero() {
                errors.push("delivery.timeout must be greater than zero".to_string());
            }
        }
    }
}
