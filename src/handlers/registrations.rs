//! Registration handlers
//!
//! Registration lifecycle, per-step form data, document review,
//! evaluation submission and contract generation.

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use crate::middleware::resolve_user_id;
use crate::models::registration::{
    Registration, RegistrationStatus, CreateRegistrationRequest, UpdateRegistrationRequest,
    RegistrationData, SaveStepDataRequest, RegistrationDocument, RegistrationDocumentDetail,
    ReviewDocumentRequest, RegistrationEvaluation, SubmitEvaluationRequest,
};
use crate::models::step::StepType;
use crate::services::contract::{generate_contract_pdf, DEFAULT_CONTRACT_TEMPLATE};
use crate::state::wizard::{validate_step_fields, AdmissionWizard};
use crate::utils::errors::AdmissioError;
use crate::utils::logging::{log_document_event, log_registration_event};
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RegistrationListQuery {
    pub user_id: Option<String>,
    pub process_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRegistrationBody {
    pub process_id: i64,
    pub user_id: Option<String>,
    pub current_step_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StepDataQuery {
    pub step_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ContractRequest {
    pub step_id: i64,
    /// Base64 PNG of the drawn signature, raw or as a data URL
    pub signature: Option<String>,
    /// Extra tag values overriding the saved registration data
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
pub struct ContractResponse {
    pub registration_id: i64,
    pub step_id: i64,
    pub pdf_path: String,
}

/// GET /api/registrations
pub async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let registrations = state
        .db
        .registrations
        .list(query.user_id.as_deref(), query.process_id)
        .await?;
    Ok(Json(registrations))
}

/// POST /api/registrations
///
/// Idempotent per (user, process): a second POST returns the existing
/// registration with 200 instead of creating a duplicate.
pub async fn create_registration(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateRegistrationBody>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let user_id = resolve_user_id(body.user_id, &headers, &state.services.auth_service)?
        .ok_or_else(|| AdmissioError::InvalidInput("user_id is required".to_string()))?;

    let request = CreateRegistrationRequest {
        process_id: body.process_id,
        user_id,
        current_step_id: body.current_step_id,
    };

    let (registration, created) = state.db.initialize_registration(request).await?;
    if created {
        log_registration_event(registration.id, &registration.user_id, "created", None);
        Ok((StatusCode::CREATED, Json(registration)))
    } else {
        Ok((StatusCode::OK, Json(registration)))
    }
}

/// GET /api/registrations/:id
pub async fn get_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Registration>, ApiError> {
    let registration = state
        .db
        .registrations
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::RegistrationNotFound { registration_id: id })?;
    Ok(Json(registration))
}

/// PUT /api/registrations/:id
///
/// Status changes are validated against the known lifecycle; step changes
/// must respect the wizard transition rules of the registration's process.
pub async fn update_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut request): Json<UpdateRegistrationRequest>,
) -> Result<Json<Registration>, ApiError> {
    let registration = state
        .db
        .registrations
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::RegistrationNotFound { registration_id: id })?;

    if let Some(status) = &request.status {
        let parsed = RegistrationStatus::parse(status)
            .ok_or_else(|| AdmissioError::InvalidInput(format!("Unknown status: {}", status)))?;

        if parsed == RegistrationStatus::Submitted && request.submitted_at.is_none() {
            request.submitted_at = Some(Utc::now());
        }
    }

    if let Some(next_step_id) = request.current_step_id {
        let steps = state.db.steps.list_by_process(registration.process_id).await?;
        let wizard = AdmissionWizard::new(&steps)?;
        wizard.validate_transition(registration.current_step_id, next_step_id)?;
    }

    let updated = state.db.registrations.update(id, request).await?;
    log_registration_event(updated.id, &updated.user_id, "updated", Some(&updated.status));
    Ok(Json(updated))
}

/// GET /api/registrations/:id/data
pub async fn list_registration_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<StepDataQuery>,
) -> Result<Json<Vec<RegistrationData>>, ApiError> {
    if state.db.registrations.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::RegistrationNotFound { registration_id: id }.into());
    }

    let data = state.db.registrations.list_data(id, query.step_id).await?;
    Ok(Json(data))
}

/// POST /api/registrations/:id/data
///
/// Replaces the step's saved values in one transaction; the incoming map
/// is validated against the step's field definitions first.
pub async fn save_registration_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<SaveStepDataRequest>,
) -> Result<(StatusCode, Json<Vec<RegistrationData>>), ApiError> {
    let fields = state.db.steps.list_fields(request.step_id).await?;
    validate_step_fields(&fields, &request.data)?;

    let data = state.db.save_step_data(id, request).await?;
    Ok((StatusCode::CREATED, Json(data)))
}

/// GET /api/registrations/:id/documents
pub async fn list_registration_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RegistrationDocumentDetail>>, ApiError> {
    if state.db.registrations.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::RegistrationNotFound { registration_id: id }.into());
    }

    let documents = state.db.registrations.list_documents(id).await?;
    Ok(Json(documents))
}

/// PUT /api/registrations/:id/documents/:doc_id
pub async fn review_registration_document(
    State(state): State<Arc<AppState>>,
    Path((id, doc_id)): Path<(i64, i64)>,
    Json(request): Json<ReviewDocumentRequest>,
) -> Result<Json<RegistrationDocument>, ApiError> {
    if state.db.registrations.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::RegistrationNotFound { registration_id: id }.into());
    }

    let document = state.db.review_document(id, doc_id, request).await?;
    log_document_event(id, document.document_id, "reviewed", Some(&document.status));
    Ok(Json(document))
}

/// GET /api/registrations/:id/evaluations
pub async fn list_registration_evaluations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RegistrationEvaluation>>, ApiError> {
    if state.db.registrations.find_by_id(id).await?.is_none() {
        return Err(AdmissioError::RegistrationNotFound { registration_id: id }.into());
    }

    let evaluations = state.db.registrations.list_evaluations(id).await?;
    Ok(Json(evaluations))
}

/// POST /api/registrations/:id/evaluations
pub async fn submit_registration_evaluation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<SubmitEvaluationRequest>,
) -> Result<(StatusCode, Json<RegistrationEvaluation>), ApiError> {
    let evaluation = state.db.submit_evaluation(id, request).await?;
    log_registration_event(id, "-", "evaluation_submitted", Some(&evaluation.status));
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// POST /api/registrations/:id/contract
///
/// Renders the contract template from the step configuration with the
/// registration's saved data, stores the PDF and records its path as the
/// contract step's data.
pub async fn generate_registration_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<ContractRequest>,
) -> Result<(StatusCode, Json<ContractResponse>), ApiError> {
    let registration = state
        .db
        .registrations
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::RegistrationNotFound { registration_id: id })?;

    let step = state
        .db
        .steps
        .find_by_id(request.step_id)
        .await?
        .ok_or(AdmissioError::StepNotFound { step_id: request.step_id })?;

    if StepType::parse(&step.step_type) != Some(StepType::Contract) {
        return Err(AdmissioError::InvalidInput(format!(
            "Step {} is not a contract step",
            step.id
        ))
        .into());
    }

    let template = step
        .config
        .as_ref()
        .and_then(|c| c.get("contractText"))
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_CONTRACT_TEMPLATE)
        .to_string();

    // All previously saved values become tag data, overridable by the body
    let mut tag_data = serde_json::Map::new();
    for row in state.db.registrations.list_data(id, None).await? {
        if let Some(value) = row.field_value {
            tag_data.insert(row.field_name, serde_json::Value::String(value));
        }
    }
    if let Some(overrides) = request.data {
        for (key, value) in overrides {
            tag_data.insert(key, value);
        }
    }

    let pdf = generate_contract_pdf(&template, &tag_data, request.signature.as_deref())?;
    let pdf_path = state
        .services
        .upload_service
        .store_contract_pdf(registration.id, &pdf)
        .await?;

    let save = SaveStepDataRequest {
        step_id: step.id,
        data: [
            ("contract_pdf_path".to_string(), serde_json::Value::String(pdf_path.clone())),
            ("signed_at".to_string(), serde_json::Value::String(Utc::now().to_rfc3339())),
        ]
        .into_iter()
        .collect(),
    };
    state.db.save_step_data(registration.id, save).await?;

    log_registration_event(registration.id, &registration.user_id, "contract_generated", Some(&pdf_path));
    Ok((
        StatusCode::CREATED,
        Json(ContractResponse { registration_id: registration.id, step_id: step.id, pdf_path }),
    ))
}
