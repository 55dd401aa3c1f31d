//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod cache;
pub mod cep;
pub mod certificate;
pub mod contract;
pub mod upload;

// Re-export commonly used services
pub use auth::{AuthService, SessionClaims, LoginRequest, SessionResponse};
pub use cache::CacheService;
pub use cep::{CepService, CepAddress};
pub use certificate::{CertificateService, CertificateData};
pub use upload::{UploadService, StoredFile};

use crate::config::settings::Settings;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub cache_service: CacheService,
    pub cep_service: CepService,
    pub certificate_service: CertificateService,
    pub upload_service: UploadService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: Settings) -> Result<Self> {
        let cache_service = CacheService::new(settings.clone())?;
        let cep_service = CepService::new(cache_service.clone(), settings.clone())?;
        let certificate_service = CertificateService::new(settings.clone());
        let upload_service = UploadService::new(settings.clone());
        let auth_service = AuthService::new(settings);

        Ok(Self {
            auth_service,
            cache_service,
            cep_service,
            certificate_service,
            upload_service,
        })
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let redis_healthy = self.cache_service.health_check().await.unwrap_or(false);

        ServiceHealthStatus {
            redis_healthy,
            cep_enabled: self.cep_service.is_enabled(),
            certificate_issuing_enabled: self.certificate_service.is_enabled(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub redis_healthy: bool,
    pub cep_enabled: bool,
    pub certificate_issuing_enabled: bool,
}

impl ServiceHealthStatus {
    /// Get list of degraded services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
