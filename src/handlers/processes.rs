//! Admission process handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use crate::models::process::{AdmissionProcess, CreateProcessRequest, UpdateProcessRequest};
use crate::models::step::AdmissionStep;
use crate::utils::errors::AdmissioError;
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ProcessListQuery {
    pub unit_id: Option<i64>,
    pub active: Option<bool>,
}

/// GET /api/processes
pub async fn list_processes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessListQuery>,
) -> Result<Json<Vec<AdmissionProcess>>, ApiError> {
    let processes = state.db.processes.list(query.unit_id, query.active).await?;
    Ok(Json(processes))
}

/// POST /api/processes
pub async fn create_process(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateProcessRequest>,
) -> Result<(StatusCode, Json<AdmissionProcess>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name is required".to_string()).into());
    }
    if state.db.units.find_by_id(request.unit_id).await?.is_none() {
        return Err(AdmissioError::UnitNotFound { unit_id: request.unit_id }.into());
    }

    let process = state.db.processes.create(request).await?;
    Ok((StatusCode::CREATED, Json(process)))
}

/// GET /api/processes/:id
pub async fn get_process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AdmissionProcess>, ApiError> {
    let process = state
        .db
        .processes
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::ProcessNotFound { process_id: id })?;
    Ok(Json(process))
}

/// PUT /api/processes/:id
pub async fn update_process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProcessRequest>,
) -> Result<Json<AdmissionProcess>, ApiError> {
    if state.db.processes.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::ProcessNotFound { process_id: id }.into());
    }

    let process = state.db.processes.update(id, request).await?;
    Ok(Json(process))
}

/// DELETE /api/processes/:id
pub async fn delete_process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.db.processes.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::ProcessNotFound { process_id: id }.into());
    }

    state.db.processes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/processes/:id/steps
pub async fn list_process_steps(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AdmissionStep>>, ApiError> {
    if state.db.processes.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::ProcessNotFound { process_id: id }.into());
    }

    let steps = state.db.steps.list_by_process(id).await?;
    Ok(Json(steps))
}
