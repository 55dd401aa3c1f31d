//! Mock session handler

use std::sync::Arc;
use axum::{extract::State, Json};
use tracing::info;
use crate::services::auth::{LoginRequest, SessionResponse};
use super::{ApiError, AppState};

/// POST /api/auth/login
///
/// Declares an identity and receives a signed session token. Parity with
/// the mock auth of the original app: no password, no account storage.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.services.auth_service.login(request)?;
    info!(user_id = %session.user_id, "Mock session issued");
    Ok(Json(session))
}
