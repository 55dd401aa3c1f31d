//! Registration models
//!
//! A registration is one user's application to one admission process,
//! together with its per-step data, uploaded documents and evaluation
//! submissions.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Registration lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    InProgress,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::InProgress => "in_progress",
            RegistrationStatus::Submitted => "submitted",
            RegistrationStatus::UnderReview => "under_review",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<RegistrationStatus> {
        match value {
            "in_progress" => Some(RegistrationStatus::InProgress),
            "submitted" => Some(RegistrationStatus::Submitted),
            "under_review" => Some(RegistrationStatus::UnderReview),
            "approved" => Some(RegistrationStatus::Approved),
            "rejected" => Some(RegistrationStatus::Rejected),
            _ => None,
        }
    }
}

/// Document review status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<DocumentStatus> {
        match value {
            "pending" => Some(DocumentStatus::Pending),
            "approved" => Some(DocumentStatus::Approved),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub process_id: i64,
    pub user_id: String,
    pub status: String,
    pub current_step_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub process_id: i64,
    pub user_id: String,
    pub current_step_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRegistrationRequest {
    pub status: Option<String>,
    pub current_step_id: Option<i64>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationData {
    pub id: i64,
    pub registration_id: i64,
    pub step_id: i64,
    pub field_name: String,
    pub field_value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One step's worth of form values, replacing whatever was saved before
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStepDataRequest {
    pub step_id: i64,
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationDocument {
    pub id: i64,
    pub registration_id: i64,
    pub document_id: i64,
    pub file_path: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Registration document joined with its step document definition
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationDocumentDetail {
    pub id: i64,
    pub registration_id: i64,
    pub document_id: i64,
    pub file_path: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub document_name: String,
    pub document_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDocumentRequest {
    pub status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationEvaluation {
    pub id: i64,
    pub registration_id: i64,
    pub evaluation_id: i64,
    pub answers: Option<serde_json::Value>,
    pub score: Option<f64>,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitEvaluationRequest {
    pub evaluation_id: i64,
    /// Answers keyed by question id
    pub answers: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_status_round_trip() {
        for value in ["in_progress", "submitted", "under_review", "approved", "rejected"] {
            assert_eq!(RegistrationStatus::parse(value).unwrap().as_str(), value);
        }
        assert!(RegistrationStatus::parse("cancelled").is_none());
    }

    #[test]
    fn test_document_status_round_trip() {
        for value in ["pending", "approved", "rejected"] {
            assert_eq!(DocumentStatus::parse(value).unwrap().as_str(), value);
        }
    }
}
