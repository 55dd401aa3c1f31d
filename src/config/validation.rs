//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{AdmissioError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_cep_config(&settings.cep)?;
    validate_storage_config(&settings.storage)?;
    validate_auth_config(&settings.auth)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate HTTP server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(AdmissioError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(AdmissioError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    url::Url::parse(&config.base_url).map_err(|e| {
        AdmissioError::Config(format!("Invalid base URL: {}", e))
    })?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AdmissioError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(AdmissioError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AdmissioError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AdmissioError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate CEP lookup configuration
fn validate_cep_config(config: &super::CepConfig) -> Result<()> {
    for (name, value) in [("primary", &config.primary_url), ("fallback", &config.fallback_url)] {
        if value.is_empty() {
            return Err(AdmissioError::Config(
                format!("CEP {} provider URL is required", name)
            ));
        }
        url::Url::parse(value).map_err(|e| {
            AdmissioError::Config(format!("Invalid CEP {} provider URL: {}", name, e))
        })?;
    }

    if config.timeout_seconds == 0 {
        return Err(AdmissioError::Config(
            "CEP timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate upload storage configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.uploads_dir.is_empty() {
        return Err(AdmissioError::Config(
            "Uploads directory is required".to_string()
        ));
    }

    if config.max_image_size_mb == 0 {
        return Err(AdmissioError::Config(
            "Max image size must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate mock session configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.is_empty() {
        return Err(AdmissioError::Config(
            "JWT secret is required".to_string()
        ));
    }

    if config.token_ttl_hours <= 0 {
        return Err(AdmissioError::Config(
            "Token TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AdmissioError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AdmissioError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut settings = Settings::default();
        settings.server.base_url = "not a url".to_string();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_min_connections_above_max_rejected() {
        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        settings.database.max_connections = 5;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
