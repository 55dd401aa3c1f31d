//! Certificate models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    pub id: i64,
    pub registration_id: i64,
    pub course_id: i64,
    pub user_id: String,
    pub certificate_code: String,
    pub public_url: String,
    pub student_name: String,
    pub course_name: String,
    pub pdf_path: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCertificateRequest {
    pub registration_id: i64,
    pub course_id: i64,
    pub user_id: String,
    pub student_name: String,
}

/// Public payload returned by the validation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateValidation {
    pub valid: bool,
    pub student_name: String,
    pub course_name: String,
    pub issued_at: DateTime<Utc>,
    pub certificate_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CertificateConfig {
    pub id: i64,
    pub course_id: i64,
    pub background_image_url: Option<String>,
    pub background_image_width: Option<i32>,
    pub background_image_height: Option<i32>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub signature_line: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertCertificateConfigRequest {
    pub course_id: i64,
    pub background_image_url: Option<String>,
    pub background_image_width: Option<i32>,
    pub background_image_height: Option<i32>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub signature_line: Option<String>,
}
