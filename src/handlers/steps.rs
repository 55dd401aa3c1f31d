//! Step catalog handlers
//!
//! Steps and their attached definitions: form fields, document
//! requirements, evaluations, evaluation modules and questions.

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crate::models::step::{
    AdmissionStep, StepType, CreateStepRequest, UpdateStepRequest,
    StepField, CreateFieldRequest, UpdateFieldRequest,
    StepDocument, CreateStepDocumentRequest, UpdateStepDocumentRequest,
    StepEvaluation, CreateEvaluationRequest, UpdateEvaluationRequest,
    EvaluationModule, CreateModuleRequest,
    EvaluationQuestion, CreateQuestionRequest,
};
use crate::utils::errors::AdmissioError;
use super::{ApiError, AppState};

/// POST /api/steps
pub async fn create_step(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateStepRequest>,
) -> Result<(StatusCode, Json<AdmissionStep>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name is required".to_string()).into());
    }
    if StepType::parse(&request.step_type).is_none() {
        return Err(AdmissioError::InvalidInput(format!("Unknown step type: {}", request.step_type)).into());
    }
    if state.db.processes.find_by_id(request.process_id).await?.is_none() {
        return Err(AdmissioError::ProcessNotFound { process_id: request.process_id }.into());
    }

    let step = state.db.steps.create(request).await?;
    Ok((StatusCode::CREATED, Json(step)))
}

/// GET /api/steps/:id
pub async fn get_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AdmissionStep>, ApiError> {
    let step = state
        .db
        .steps
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::StepNotFound { step_id: id })?;
    Ok(Json(step))
}

/// PUT /api/steps/:id
pub async fn update_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStepRequest>,
) -> Result<Json<AdmissionStep>, ApiError> {
    if let Some(step_type) = &request.step_type {
        if StepType::parse(step_type).is_none() {
            return Err(AdmissioError::InvalidInput(format!("Unknown step type: {}", step_type)).into());
        }
    }
    if state.db.steps.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::StepNotFound { step_id: id }.into());
    }

    let step = state.db.steps.update(id, request).await?;
    Ok(Json(step))
}

/// DELETE /api/steps/:id
pub async fn delete_step(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.db.steps.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::StepNotFound { step_id: id }.into());
    }

    state.db.steps.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_step_exists(state: &AppState, step_id: i64) -> Result<(), ApiError> {
    if state.db.steps.find_by_id(step_id).await?.is_none() {
        return Err(AdmissioError::StepNotFound { step_id }.into());
    }
    Ok(())
}

async fn ensure_evaluation_exists(state: &AppState, evaluation_id: i64) -> Result<(), ApiError> {
    if state.db.steps.find_evaluation(evaluation_id).await?.is_none() {
        return Err(AdmissioError::EvaluationNotFound { evaluation_id }.into());
    }
    Ok(())
}

/// GET /api/steps/:id/fields
pub async fn list_fields(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StepField>>, ApiError> {
    ensure_step_exists(&state, id).await?;
    let fields = state.db.steps.list_fields(id).await?;
    Ok(Json(fields))
}

/// POST /api/steps/:id/fields
pub async fn create_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<StepField>), ApiError> {
    if request.field_name.trim().is_empty() || request.field_label.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("field_name and field_label are required".to_string()).into());
    }
    ensure_step_exists(&state, id).await?;

    let field = state.db.steps.create_field(id, request).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

/// PUT /api/fields/:id
pub async fn update_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateFieldRequest>,
) -> Result<Json<StepField>, ApiError> {
    let field = state.db.steps.update_field(id, request).await?;
    Ok(Json(field))
}

/// DELETE /api/fields/:id
pub async fn delete_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.steps.delete_field(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/steps/:id/documents
pub async fn list_step_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StepDocument>>, ApiError> {
    ensure_step_exists(&state, id).await?;
    let documents = state.db.steps.list_documents(id).await?;
    Ok(Json(documents))
}

/// POST /api/steps/:id/documents
pub async fn create_step_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CreateStepDocumentRequest>,
) -> Result<(StatusCode, Json<StepDocument>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name is required".to_string()).into());
    }
    ensure_step_exists(&state, id).await?;

    let document = state.db.steps.create_document(id, request).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// PUT /api/step-documents/:id
pub async fn update_step_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStepDocumentRequest>,
) -> Result<Json<StepDocument>, ApiError> {
    let document = state.db.steps.update_document(id, request).await?;
    Ok(Json(document))
}

/// DELETE /api/step-documents/:id
pub async fn delete_step_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.steps.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/steps/:id/evaluations
pub async fn list_evaluations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<StepEvaluation>>, ApiError> {
    ensure_step_exists(&state, id).await?;
    let evaluations = state.db.steps.list_evaluations(id).await?;
    Ok(Json(evaluations))
}

/// POST /api/steps/:id/evaluations
pub async fn create_evaluation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<StepEvaluation>), ApiError> {
    if request.name.trim().is_empty() || request.evaluation_type.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name and evaluation_type are required".to_string()).into());
    }
    ensure_step_exists(&state, id).await?;

    let evaluation = state.db.steps.create_evaluation(id, request).await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// PUT /api/evaluations/:id
pub async fn update_evaluation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEvaluationRequest>,
) -> Result<Json<StepEvaluation>, ApiError> {
    ensure_evaluation_exists(&state, id).await?;
    let evaluation = state.db.steps.update_evaluation(id, request).await?;
    Ok(Json(evaluation))
}

/// DELETE /api/evaluations/:id
pub async fn delete_evaluation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ensure_evaluation_exists(&state, id).await?;
    state.db.steps.delete_evaluation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/evaluations/:id/modules
pub async fn list_modules(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EvaluationModule>>, ApiError> {
    ensure_evaluation_exists(&state, id).await?;
    let modules = state.db.steps.list_modules(id).await?;
    Ok(Json(modules))
}

/// POST /api/evaluations/:id/modules
pub async fn create_module(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CreateModuleRequest>,
) -> Result<(StatusCode, Json<EvaluationModule>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("name is required".to_string()).into());
    }
    ensure_evaluation_exists(&state, id).await?;

    let module = state.db.steps.create_module(id, request).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

/// GET /api/evaluations/:id/questions
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<EvaluationQuestion>>, ApiError> {
    ensure_evaluation_exists(&state, id).await?;
    let questions = state.db.steps.list_questions(id).await?;
    Ok(Json(questions))
}

/// POST /api/evaluations/:id/questions
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<EvaluationQuestion>), ApiError> {
    if request.question_text.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("question_text is required".to_string()).into());
    }
    ensure_evaluation_exists(&state, id).await?;

    let question = state.db.steps.create_question(id, request).await?;
    Ok((StatusCode::CREATED, Json(question)))
}
