//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub cep: CepConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used to build certificate validation links
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Postal code (CEP) lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CepConfig {
    pub primary_url: String,
    pub fallback_url: String,
    pub timeout_seconds: u64,
    /// Cache lifetime for resolved codes, 24 hours by default
    pub cache_ttl_seconds: u64,
}

/// Upload storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub uploads_dir: String,
    pub max_image_size_mb: u64,
}

/// Mock session token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub cep_lookup: bool,
    pub certificate_issuing: bool,
    pub validate_rate_limit_per_minute: u32,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("ADMISSIO").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::AdmissioError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/admissio".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "admissio:".to_string(),
                ttl_seconds: 3600,
            },
            cep: CepConfig {
                primary_url: "https://viacep.com.br/ws".to_string(),
                fallback_url: "https://brasilapi.com.br/api/cep/v1".to_string(),
                timeout_seconds: 5,
                cache_ttl_seconds: 24 * 60 * 60,
            },
            storage: StorageConfig {
                uploads_dir: "uploads".to_string(),
                max_image_size_mb: 10,
            },
            auth: AuthConfig {
                jwt_secret: "change-me".to_string(),
                token_ttl_hours: 24,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
            features: FeaturesConfig {
                cep_lookup: true,
                certificate_issuing: true,
                validate_rate_limit_per_minute: 30,
            },
        }
    }
}
