//! Document upload handler

use std::sync::Arc;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use crate::models::registration::RegistrationDocument;
use crate::utils::errors::AdmissioError;
use crate::utils::logging::log_document_event;
use super::{ApiError, AppState};

/// POST /api/documents
///
/// Multipart form: `registration_id`, `document_id` and `file`. The file
/// is checked against the document requirement's extension allow-list and
/// size ceiling before being stored.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RegistrationDocument>), ApiError> {
    let mut registration_id: Option<i64> = None;
    let mut document_id: Option<i64> = None;
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdmissioError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("registration_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AdmissioError::InvalidInput(e.to_string()))?;
                registration_id = Some(parse_id("registration_id", &text)?);
            }
            Some("document_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AdmissioError::InvalidInput(e.to_string()))?;
                document_id = Some(parse_id("document_id", &text)?);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AdmissioError::InvalidInput("file must have a filename".to_string()))?;
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AdmissioError::InvalidInput(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let registration_id = registration_id
        .ok_or_else(|| AdmissioError::InvalidInput("registration_id is required".to_string()))?;
    let document_id = document_id
        .ok_or_else(|| AdmissioError::InvalidInput("document_id is required".to_string()))?;
    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AdmissioError::InvalidInput("file is required".to_string()))?;

    if state.db.registrations.find_by_id(registration_id).await?.is_none() {
        return Err(AdmissioError::RegistrationNotFound { registration_id }.into());
    }
    let requirement = state
        .db
        .steps
        .find_document(document_id)
        .await?
        .ok_or(AdmissioError::DocumentNotFound { document_id })?;

    let stored = state
        .services
        .upload_service
        .store_document(&requirement, &file_name, &bytes)
        .await?;

    let document = state
        .db
        .registrations
        .insert_document(
            registration_id,
            document_id,
            &stored.public_path,
            &stored.file_name,
            stored.file_size,
            content_type.as_deref(),
        )
        .await?;

    log_document_event(registration_id, document_id, "uploaded", Some(&stored.public_path));
    Ok((StatusCode::CREATED, Json(document)))
}

fn parse_id(name: &str, value: &str) -> Result<i64, AdmissioError> {
    value
        .trim()
        .parse()
        .map_err(|_| AdmissioError::InvalidInput(format!("{} must be a number", name)))
}
