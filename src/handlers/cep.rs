//! CEP lookup handler

use std::sync::Arc;
use axum::{extract::{Path, State}, Json};
use crate::services::cep::CepAddress;
use crate::utils::errors::AdmissioError;
use super::{ApiError, AppState};

/// GET /api/cep/:cep
pub async fn lookup_cep(
    State(state): State<Arc<AppState>>,
    Path(cep): Path<String>,
) -> Result<Json<CepAddress>, ApiError> {
    if !state.services.cep_service.is_enabled() {
        return Err(AdmissioError::ServiceUnavailable("CEP lookup is disabled".to_string()).into());
    }

    let address = state.services.cep_service.lookup(&cep).await?;
    Ok(Json(address))
}
