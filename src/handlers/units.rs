//! Unit handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use crate::models::unit::{Unit, CreateUnitRequest, UpdateUnitRequest};
use crate::utils::errors::AdmissioError;
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct UnitListQuery {
    pub course_id: Option<i64>,
}

/// GET /api/units
pub async fn list_units(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UnitListQuery>,
) -> Result<Json<Vec<Unit>>, ApiError> {
    let units = state.db.units.list(query.course_id).await?;
    Ok(Json(units))
}

/// POST /api/units
pub async fn create_unit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateUnitRequest>,
) -> Result<(StatusCode, Json<Unit>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name is required".to_string()).into());
    }
    if state.db.courses.find_by_id(request.course_id).await?.is_none() {
        return Err(AdmissioError::CourseNotFound { course_id: request.course_id }.into());
    }

    let unit = state.db.units.create(request).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

/// GET /api/units/:id
pub async fn get_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Unit>, ApiError> {
    let unit = state
        .db
        .units
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::UnitNotFound { unit_id: id })?;
    Ok(Json(unit))
}

/// PUT /api/units/:id
pub async fn update_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUnitRequest>,
) -> Result<Json<Unit>, ApiError> {
    if state.db.units.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::UnitNotFound { unit_id: id }.into());
    }

    let unit = state.db.units.update(id, request).await?;
    Ok(Json(unit))
}

/// DELETE /api/units/:id
pub async fn delete_unit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.db.units.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::UnitNotFound { unit_id: id }.into());
    }

    state.db.units.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
