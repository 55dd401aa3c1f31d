//! Course handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use crate::models::course::{Course, CreateCourseRequest, UpdateCourseRequest};
use crate::utils::errors::AdmissioError;
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    #[serde(rename = "type")]
    pub course_type: Option<String>,
    pub modality: Option<String>,
}

/// GET /api/courses
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = state
        .db
        .courses
        .list(query.course_type.as_deref(), query.modality.as_deref())
        .await?;
    Ok(Json(courses))
}

/// POST /api/courses
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name is required".to_string()).into());
    }
    if request.course_type.trim().is_empty() || request.modality.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("type and modality are required".to_string()).into());
    }

    let course = state.db.courses.create(request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /api/courses/:id
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, ApiError> {
    let course = state
        .db
        .courses
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::CourseNotFound { course_id: id })?;
    Ok(Json(course))
}

/// PUT /api/courses/:id
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    if state.db.courses.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::CourseNotFound { course_id: id }.into());
    }

    let course = state.db.courses.update(id, request).await?;
    Ok(Json(course))
}

/// DELETE /api/courses/:id
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.db.courses.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::CourseNotFound { course_id: id }.into());
    }

    state.db.courses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
