//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{ApiConfig, AuthProvider, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, then validate.
pub fn load_config(path: &Path) -> Result<ApiConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ApiConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus environment overrides, validated.
pub fn from_env() -> Result<ApiConfig, ConfigError> {
    let mut config = ApiConfig::default();

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply recognised environment variables on top of `config`.
///
/// `lookup` abstracts `std::env::var` so callers can supply their own source.
pub fn apply_env_overrides<F>(config: &mut ApiConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    } else if let Some(port) = lookup("PORT") {
        let port: u16 = parse_var("PORT", port)?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map_or("0.0.0.0", |(host, _)| host)
            .to_string();
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    if let Some(v) = lookup("RATE_LIMIT_ENABLED") {
        config.rate_limit.enabled = parse_bool("RATE_LIMIT_ENABLED", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = parse_var("RATE_LIMIT_WINDOW_MS", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX_REQUESTS", v)?;
    }
    if let Some(v) = lookup("RATE_LIMIT_MAX_ENTRIES") {
        config.rate_limit.max_entries = parse_var("RATE_LIMIT_MAX_ENTRIES", v)?;
    }

    if let Some(url) = lookup("AUTH_URL") {
        config.auth.url = Some(url);
        if config.auth.provider == AuthProvider::None {
            config.auth.provider = AuthProvider::Remote;
        }
    }
    if let Some(key) = lookup("AUTH_API_KEY") {
        config.auth.api_key = key;
    }
    if let Some(key) = lookup("ADMIN_API_KEY") {
        config.admin.api_key = key;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.observability.log_format = match v.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => return Err(ConfigError::Env { var: "LOG_FORMAT", value: v }),
        };
    }
    if let Some(v) = lookup("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_bool("METRICS_ENABLED", v)?;
    }

    Ok(())
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env { var, value }),
    }
}
