//! Authentication middleware
//!
//! Extracts the mock session identity from a bearer token when present.
//! There is no authorization: the identity only fills in user attribution
//! where the request body does not carry it.

use axum::http::HeaderMap;
use tracing::debug;
use crate::services::auth::AuthService;
use crate::utils::errors::{AdmissioError, Result};

/// Identity carried by a verified session token
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
}

/// Read and verify the Authorization header, if any.
///
/// A missing header yields `None`; a present but invalid token is an
/// authentication error.
pub fn authenticate(headers: &HeaderMap, auth_service: &AuthService) -> Result<Option<AuthContext>> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let raw = value
        .to_str()
        .map_err(|_| AdmissioError::Authentication("Malformed authorization header".to_string()))?;
    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| AdmissioError::Authentication("Expected a bearer token".to_string()))?;

    let claims = auth_service.verify_token(token)?;
    debug!(user_id = %claims.sub, "Session token verified");

    Ok(Some(AuthContext {
        user_id: claims.sub,
        name: claims.name,
        email: claims.email,
    }))
}

/// Resolve the acting user id: explicit value wins, then the session token
pub fn resolve_user_id(
    explicit: Option<String>,
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<Option<String>> {
    if let Some(user_id) = explicit.filter(|id| !id.trim().is_empty()) {
        return Ok(Some(user_id));
    }
    Ok(authenticate(headers, auth_service)?.map(|ctx| ctx.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::AUTHORIZATION;
    use crate::config::Settings;
    use crate::services::auth::LoginRequest;

    fn auth_service() -> AuthService {
        AuthService::new(Settings::default())
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let headers = HeaderMap::new();
        assert!(authenticate(&headers, &auth_service()).unwrap().is_none());
    }

    #[test]
    fn test_valid_bearer_token() {
        let svc = auth_service();
        let session = svc
            .login(LoginRequest { user_id: Some("u1".to_string()), name: "Maria".to_string(), email: None })
            .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", session.token).parse().unwrap());

        let ctx = authenticate(&headers, &svc).unwrap().unwrap();
        assert_eq!(ctx.user_id, "u1");
    }

    #[test]
    fn test_garbage_token_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer not.a.token".parse().unwrap());
        assert!(authenticate(&headers, &auth_service()).is_err());
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(authenticate(&headers, &auth_service()).is_err());
    }

    #[test]
    fn test_resolve_user_id_prefers_explicit() {
        let headers = HeaderMap::new();
        let resolved = resolve_user_id(Some("explicit".to_string()), &headers, &auth_service()).unwrap();
        assert_eq!(resolved.as_deref(), Some("explicit"));

        let resolved = resolve_user_id(None, &headers, &auth_service()).unwrap();
        assert!(resolved.is_none());
    }
}
