//! Error handling for Admissio
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the Admissio application
#[derive(Error, Debug)]
pub enum AdmissioError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CEP lookup error: {0}")]
    Cep(#[from] CepError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Course not found: {course_id}")]
    CourseNotFound { course_id: i64 },

    #[error("Unit not found: {unit_id}")]
    UnitNotFound { unit_id: i64 },

    #[error("Admission process not found: {process_id}")]
    ProcessNotFound { process_id: i64 },

    #[error("Step not found: {step_id}")]
    StepNotFound { step_id: i64 },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: i64 },

    #[error("Document not found: {document_id}")]
    DocumentNotFound { document_id: i64 },

    #[error("Evaluation not found: {evaluation_id}")]
    EvaluationNotFound { evaluation_id: i64 },

    #[error("Certificate not found: {code}")]
    CertificateNotFound { code: String },

    #[error("Invalid step transition: {from} -> {to}")]
    InvalidStepTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("PDF generation error: {0}")]
    Pdf(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// CEP provider specific errors
#[derive(Error, Debug)]
pub enum CepError {
    #[error("CEP request failed: {0}")]
    RequestFailed(String),

    #[error("CEP request timed out")]
    Timeout,

    #[error("Invalid CEP response: {0}")]
    InvalidResponse(String),

    #[error("CEP not found: {0}")]
    NotFound(String),

    #[error("CEP provider unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Admissio operations
pub type Result<T> = std::result::Result<T, AdmissioError>;

/// Result type alias for CEP operations
pub type CepResult<T> = std::result::Result<T, CepError>;

impl AdmissioError {
    /// Whether the error maps to a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AdmissioError::CourseNotFound { .. }
                | AdmissioError::UnitNotFound { .. }
                | AdmissioError::ProcessNotFound { .. }
                | AdmissioError::StepNotFound { .. }
                | AdmissioError::RegistrationNotFound { .. }
                | AdmissioError::DocumentNotFound { .. }
                | AdmissioError::EvaluationNotFound { .. }
                | AdmissioError::CertificateNotFound { .. }
                | AdmissioError::Cep(CepError::NotFound(_))
        ) || matches!(self, AdmissioError::Database(sqlx::Error::RowNotFound))
    }

    /// Whether the error was caused by bad client input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdmissioError::InvalidInput(_) | AdmissioError::InvalidStepTransition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = AdmissioError::RegistrationNotFound { registration_id: 7 };
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        let err = AdmissioError::InvalidStepTransition {
            from: "basic_data".to_string(),
            to: "contract".to_string(),
        };
        assert!(err.is_validation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_cep_not_found_maps_to_not_found() {
        let err = AdmissioError::Cep(CepError::NotFound("01310100".to_string()));
        assert!(err.is_not_found());
    }
}
