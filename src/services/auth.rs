//! Mock session service implementation
//!
//! There is no real account system; the login endpoint hands out a signed
//! token carrying whatever identity the caller declared, mirroring the
//! mock auth context of the original frontend. The token is only used to
//! attribute registrations and certificates to a user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::config::settings::Settings;
use crate::utils::errors::{AdmissioError, Result};

/// Claims stored in the mock session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub name: String,
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
}

/// Mock session service
#[derive(Debug, Clone)]
pub struct AuthService {
    settings: Settings,
}

impl AuthService {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Create a session for the declared identity
    pub fn login(&self, request: LoginRequest) -> Result<SessionResponse> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(AdmissioError::InvalidInput("name is required".to_string()));
        }

        let user_id = request
            .user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let token = self.issue_token(&user_id, &name, request.email.as_deref())?;

        Ok(SessionResponse {
            token,
            user_id,
            name,
            email: request.email,
        })
    }

    /// Sign a session token
    pub fn issue_token(&self, user_id: &str, name: &str, email: Option<&str>) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.settings.auth.token_ttl_hours)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.auth.jwt_secret.as_bytes()),
        )
        .map_err(AdmissioError::Token)
    }

    /// Decode and validate a session token
    pub fn verify_token(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.settings.auth.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AdmissioError::Authentication(e.to_string()))?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(Settings::default())
    }

    #[test]
    fn test_login_issues_verifiable_token() {
        let svc = service();
        let session = svc
            .login(LoginRequest {
                user_id: Some("user-1".to_string()),
                name: "Maria".to_string(),
                email: Some("maria@example.com".to_string()),
            })
            .unwrap();

        let claims = svc.verify_token(&session.token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.name, "Maria");
        assert_eq!(claims.email.as_deref(), Some("maria@example.com"));
    }

    #[test]
    fn test_login_generates_user_id_when_absent() {
        let svc = service();
        let session = svc
            .login(LoginRequest { user_id: None, name: "Ana".to_string(), email: None })
            .unwrap();
        assert!(!session.user_id.is_empty());
    }

    #[test]
    fn test_login_requires_name() {
        let svc = service();
        let err = svc
            .login(LoginRequest { user_id: None, name: "  ".to_string(), email: None })
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let svc = service();
        let session = svc
            .login(LoginRequest { user_id: Some("u".to_string()), name: "N".to_string(), email: None })
            .unwrap();

        let mut other_settings = Settings::default();
        other_settings.auth.jwt_secret = "different-secret".to_string();
        let other = AuthService::new(other_settings);
        assert!(other.verify_token(&session.token).is_err());
    }
}
