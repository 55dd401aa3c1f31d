//! CEP (postal code) lookup service implementation
//!
//! Resolves Brazilian postal codes through two public providers with a
//! Redis-backed 24-hour cache: ViaCEP is consulted first and BrasilAPI
//! is the fallback when the primary fails or misses.

use std::time::Duration;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{warn, debug};
use crate::config::settings::Settings;
use crate::services::cache::CacheService;
use crate::utils::errors::{AdmissioError, CepError, Result};
use crate::utils::helpers::{clean_digits, is_valid_cep_format};
use crate::utils::logging::log_cep_lookup;

/// Normalized address returned to callers regardless of provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CepAddress {
    pub cep: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// ViaCEP response structure
#[derive(Debug, Clone, Deserialize)]
struct ViaCepResponse {
    cep: Option<String>,
    logradouro: Option<String>,
    complemento: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    /// Present (as bool or string) when the code is unknown
    erro: Option<serde_json::Value>,
}

/// BrasilAPI response structure
#[derive(Debug, Clone, Deserialize)]
struct BrasilApiResponse {
    cep: Option<String>,
    street: Option<String>,
    neighborhood: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

/// CEP lookup service
#[derive(Debug, Clone)]
pub struct CepService {
    client: Client,
    cache: CacheService,
    settings: Settings,
}

impl CepService {
    /// Create a new CepService instance
    pub fn new(cache: CacheService, settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.cep.timeout_seconds))
            .user_agent("Admissio/1.0")
            .build()
            .map_err(AdmissioError::Http)?;

        Ok(Self { client, cache, settings })
    }

    /// Resolve a postal code, consulting the cache before the providers
    pub async fn lookup(&self, cep: &str) -> Result<CepAddress> {
        if !is_valid_cep_format(cep) {
            return Err(AdmissioError::InvalidInput(format!("Invalid CEP format: {}", cep)));
        }
        let cleaned = clean_digits(cep);

        // Cache failures must not break lookups, degrade to the providers
        match self.cached(&cleaned).await {
            Ok(Some(address)) => {
                debug!(cep = %cleaned, "CEP cache hit");
                return Ok(address);
            }
            Ok(None) => {}
            Err(e) => warn!(cep = %cleaned, error = %e, "CEP cache read failed"),
        }

        let address = self.lookup_with_fallback(&cleaned).await?;

        if let Err(e) = self
            .cache
            .set(&cache_key(&cleaned), &address, Some(self.settings.cep.cache_ttl_seconds))
            .await
        {
            warn!(cep = %cleaned, error = %e, "CEP cache write failed");
        }

        Ok(address)
    }

    async fn cached(&self, cleaned: &str) -> Result<Option<CepAddress>> {
        self.cache.get(&cache_key(cleaned)).await
    }

    async fn lookup_with_fallback(&self, cleaned: &str) -> Result<CepAddress> {
        match self.fetch_primary(cleaned).await {
            Ok(address) => {
                log_cep_lookup(cleaned, "viacep", true);
                return Ok(address);
            }
            Err(e) => {
                log_cep_lookup(cleaned, "viacep", false);
                debug!(cep = %cleaned, error = %e, "Primary CEP provider failed, trying fallback");
            }
        }

        match self.fetch_fallback(cleaned).await {
            Ok(address) => {
                log_cep_lookup(cleaned, "brasilapi", true);
                Ok(address)
            }
            Err(e) => {
                log_cep_lookup(cleaned, "brasilapi", false);
                warn!(cep = %cleaned, error = %e, "All CEP providers failed");
                Err(AdmissioError::Cep(CepError::NotFound(cleaned.to_string())))
            }
        }
    }

    /// Query ViaCEP
    async fn fetch_primary(&self, cleaned: &str) -> Result<CepAddress> {
        let url = format!("{}/{}/json/", self.settings.cep.primary_url.trim_end_matches('/'), cleaned);

        let response = self.client.get(&url).send().await.map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(AdmissioError::Cep(CepError::RequestFailed(
                format!("HTTP {}", response.status())
            )));
        }

        let body: ViaCepResponse = response.json().await
            .map_err(|e| AdmissioError::Cep(CepError::InvalidResponse(e.to_string())))?;

        if body.erro.is_some() {
            return Err(AdmissioError::Cep(CepError::NotFound(cleaned.to_string())));
        }

        Ok(CepAddress {
            cep: body.cep.unwrap_or_else(|| cleaned.to_string()),
            street: body.logradouro.unwrap_or_default(),
            complement: body.complemento.unwrap_or_default(),
            neighborhood: body.bairro.unwrap_or_default(),
            city: body.localidade.unwrap_or_default(),
            state: body.uf.unwrap_or_default(),
        })
    }

    /// Query BrasilAPI
    async fn fetch_fallback(&self, cleaned: &str) -> Result<CepAddress> {
        let url = format!("{}/{}", self.settings.cep.fallback_url.trim_end_matches('/'), cleaned);

        let response = self.client.get(&url).send().await.map_err(map_request_error)?;

        if response.status().as_u16() == 404 {
            return Err(AdmissioError::Cep(CepError::NotFound(cleaned.to_string())));
        }
        if !response.status().is_success() {
            return Err(AdmissioError::Cep(CepError::RequestFailed(
                format!("HTTP {}", response.status())
            )));
        }

        let body: BrasilApiResponse = response.json().await
            .map_err(|e| AdmissioError::Cep(CepError::InvalidResponse(e.to_string())))?;

        Ok(CepAddress {
            cep: body.cep.unwrap_or_else(|| cleaned.to_string()),
            street: body.street.unwrap_or_default(),
            complement: String::new(),
            neighborhood: body.neighborhood.unwrap_or_default(),
            city: body.city.unwrap_or_default(),
            state: body.state.unwrap_or_default(),
        })
    }

    /// Check if CEP lookup is enabled
    pub fn is_enabled(&self) -> bool {
        self.settings.features.cep_lookup
    }
}

fn cache_key(cleaned: &str) -> String {
    format!("cep:{}", cleaned)
}

fn map_request_error(e: reqwest::Error) -> AdmissioError {
    if e.is_timeout() {
        AdmissioError::Cep(CepError::Timeout)
    } else if e.is_connect() {
        AdmissioError::Cep(CepError::ServiceUnavailable)
    } else {
        AdmissioError::Cep(CepError::RequestFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viacep_response_deserialization() {
        let json = r#"{"cep": "01310-100", "logradouro": "Avenida Paulista", "complemento": "", "bairro": "Bela Vista", "localidade": "Sao Paulo", "uf": "SP"}"#;
        let response: ViaCepResponse = serde_json::from_str(json).unwrap();
        assert!(response.erro.is_none());
        assert_eq!(response.localidade.as_deref(), Some("Sao Paulo"));
    }

    #[test]
    fn test_viacep_error_marker() {
        // the provider reports unknown codes with an "erro" marker, sometimes
        // as a bool and sometimes as a string
        for json in [r#"{"erro": true}"#, r#"{"erro": "true"}"#] {
            let response: ViaCepResponse = serde_json::from_str(json).unwrap();
            assert!(response.erro.is_some());
        }
    }

    #[test]
    fn test_brasilapi_response_deserialization() {
        let json = r#"{"cep": "01310100", "state": "SP", "city": "Sao Paulo", "neighborhood": "Bela Vista", "street": "Avenida Paulista", "service": "correios"}"#;
        let response: BrasilApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.state.as_deref(), Some("SP"));
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("01310100"), "cep:01310100");
    }
}
