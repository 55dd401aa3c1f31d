//! Certificate handlers
//!
//! Issuance, download, public validation and per-course layout
//! configuration.

use std::sync::Arc;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use crate::middleware::resolve_user_id;
use crate::models::certificate::{
    Certificate, CertificateValidation, CertificateConfig, GenerateCertificateRequest,
    UpsertCertificateConfigRequest,
};
use crate::services::certificate::CertificateData;
use crate::utils::errors::AdmissioError;
use crate::utils::helpers::generate_certificate_code;
use crate::utils::logging::log_certificate_event;
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CertificateListQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    #[serde(alias = "courseId")]
    pub course_id: i64,
}

/// Accepts both snake_case and the original frontend's camelCase keys
#[derive(Debug, Deserialize)]
pub struct UpsertConfigBody {
    #[serde(alias = "courseId")]
    pub course_id: i64,
    #[serde(alias = "backgroundImageUrl")]
    pub background_image_url: Option<String>,
    #[serde(alias = "backgroundImageWidth")]
    pub background_image_width: Option<i32>,
    #[serde(alias = "backgroundImageHeight")]
    pub background_image_height: Option<i32>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(alias = "signatureLine")]
    pub signature_line: Option<String>,
}

/// GET /api/certificates
pub async fn list_certificates(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CertificateListQuery>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    let user_id = resolve_user_id(query.user_id, &headers, &state.services.auth_service)?;
    let certificates = state.db.certificates.list(user_id.as_deref()).await?;
    Ok(Json(certificates))
}

/// GET /api/certificates/:id
pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Certificate>, ApiError> {
    let certificate = state
        .db
        .certificates
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::CertificateNotFound { code: id.to_string() })?;
    Ok(Json(certificate))
}

/// POST /api/certificates/generate
pub async fn generate_certificate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateCertificateRequest>,
) -> Result<(StatusCode, Json<Certificate>), ApiError> {
    if !state.services.certificate_service.is_enabled() {
        return Err(AdmissioError::ServiceUnavailable("Certificate issuing is disabled".to_string()).into());
    }
    if request.student_name.trim().is_empty() || request.user_id.trim().is_empty() {
        return Err(AdmissioError::InvalidInput("user_id and student_name are required".to_string()).into());
    }

    let course = state
        .db
        .courses
        .find_by_id(request.course_id)
        .await?
        .ok_or(AdmissioError::CourseNotFound { course_id: request.course_id })?;

    if state.db.registrations.find_by_id(request.registration_id).await?.is_none() {
        return Err(AdmissioError::RegistrationNotFound { registration_id: request.registration_id }.into());
    }

    let config = state.db.certificates.find_config(request.course_id).await?;

    // A missing background file degrades to a plain certificate
    let background_image = match config.as_ref().and_then(|c| c.background_image_url.clone()) {
        Some(path) => match state.services.upload_service.read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to load certificate background");
                None
            }
        },
        None => None,
    };

    let certificate_code = generate_certificate_code();
    let public_url = state.services.certificate_service.build_public_url(&certificate_code);

    let pdf = state.services.certificate_service.generate_pdf(&CertificateData {
        student_name: request.student_name.clone(),
        course_name: course.name.clone(),
        issued_at: Utc::now(),
        certificate_code: certificate_code.clone(),
        public_url: public_url.clone(),
        background_image,
        title: config.as_ref().and_then(|c| c.title.clone()),
        subtitle: config.as_ref().and_then(|c| c.subtitle.clone()),
        signature_line: config.as_ref().and_then(|c| c.signature_line.clone()),
    })?;

    let pdf_path = state
        .services
        .upload_service
        .store_certificate_pdf(&certificate_code, &pdf)
        .await?;

    let certificate = state
        .db
        .certificates
        .create(
            request.registration_id,
            request.course_id,
            &request.user_id,
            &certificate_code,
            &public_url,
            &request.student_name,
            &course.name,
            &pdf_path,
        )
        .await?;

    log_certificate_event(&certificate_code, "issued", Some(&request.user_id));
    Ok((StatusCode::CREATED, Json(certificate)))
}

/// GET /api/certificates/:id/download
pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let certificate = state
        .db
        .certificates
        .find_by_id(id)
        .await?
        .ok_or(AdmissioError::CertificateNotFound { code: id.to_string() })?;

    let bytes = state.services.upload_service.read(&certificate.pdf_path).await?;

    let disposition = format!(
        "attachment; filename=\"certificate-{}.pdf\"",
        certificate.certificate_code
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/certificates/validate/:code
///
/// Public endpoint; rate limited per code. Repeated validations of the
/// same code always return the same public data.
pub async fn validate_certificate(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    state.validate_limiter.check(&code)?;

    match state.db.certificates.find_by_code(&code).await? {
        Some(certificate) => {
            log_certificate_event(&code, "validated", None);
            let validation = CertificateValidation {
                valid: true,
                student_name: certificate.student_name,
                course_name: certificate.course_name,
                issued_at: certificate.issued_at,
                certificate_code: certificate.certificate_code,
            };
            Ok(Json(validation).into_response())
        }
        None => {
            log_certificate_event(&code, "validation_miss", None);
            Ok((
                StatusCode::NOT_FOUND,
                Json(json!({ "valid": false, "error": "Certificado não encontrado" })),
            )
                .into_response())
        }
    }
}

/// GET /api/certificates/configs
pub async fn get_certificate_config(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfigQuery>,
) -> Result<Json<Option<CertificateConfig>>, ApiError> {
    let config = state.db.certificates.find_config(query.course_id).await?;
    Ok(Json(config))
}

/// POST /api/certificates/configs
pub async fn upsert_certificate_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpsertConfigBody>,
) -> Result<Json<CertificateConfig>, ApiError> {
    if state.db.courses.find_by_id(body.course_id).await?.is_none() {
        return Err(AdmissioError::CourseNotFound { course_id: body.course_id }.into());
    }

    let config = state
        .db
        .certificates
        .upsert_config(UpsertCertificateConfigRequest {
            course_id: body.course_id,
            background_image_url: body.background_image_url,
            background_image_width: body.background_image_width,
            background_image_height: body.background_image_height,
            title: body.title,
            subtitle: body.subtitle,
            signature_line: body.signature_line,
        })
        .await?;

    Ok(Json(config))
}

/// POST /api/certificates/configs/upload
///
/// Multipart background image upload. Returns the stored URL and the
/// parsed pixel dimensions; the client persists them via the config
/// endpoint.
pub async fn upload_certificate_background(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdmissioError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("background.png").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AdmissioError::InvalidInput(format!("Failed to read file: {}", e)))?;
            file = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| AdmissioError::InvalidInput("file is required".to_string()))?;

    let (url, width, height) = state
        .services
        .upload_service
        .store_background_image(&file_name, &bytes)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "url": url, "width": width, "height": height }))))
}
