//! Certificate repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::certificate::{Certificate, CertificateConfig, UpsertCertificateConfigRequest};
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct CertificateRepository {
    pool: PgPool,
}

impl CertificateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an issued certificate
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        registration_id: i64,
        course_id: i64,
        user_id: &str,
        certificate_code: &str,
        public_url: &str,
        student_name: &str,
        course_name: &str,
        pdf_path: &str,
    ) -> Result<Certificate, AdmissioError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            r#"
            INSERT INTO certificates (registration_id, course_id, user_id, certificate_code, public_url, student_name, course_name, pdf_path, issued_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, registration_id, course_id, user_id, certificate_code, public_url, student_name, course_name, pdf_path, issued_at
            "#
        )
        .bind(registration_id)
        .bind(course_id)
        .bind(user_id)
        .bind(certificate_code)
        .bind(public_url)
        .bind(student_name)
        .bind(course_name)
        .bind(pdf_path)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(certificate)
    }

    /// Find certificate by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Certificate>, AdmissioError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            "SELECT id, registration_id, course_id, user_id, certificate_code, public_url, student_name, course_name, pdf_path, issued_at FROM certificates WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(certificate)
    }

    /// Find certificate by its public validation code
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Certificate>, AdmissioError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            "SELECT id, registration_id, course_id, user_id, certificate_code, public_url, student_name, course_name, pdf_path, issued_at FROM certificates WHERE certificate_code = $1"
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(certificate)
    }

    /// List certificates, optionally restricted to one user
    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<Certificate>, AdmissioError> {
        let certificates = sqlx::query_as::<_, Certificate>(
            r#"
            SELECT id, registration_id, course_id, user_id, certificate_code, public_url, student_name, course_name, pdf_path, issued_at
            FROM certificates
            WHERE ($1::text IS NULL OR user_id = $1)
            ORDER BY issued_at DESC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(certificates)
    }

    /// Fetch the certificate layout config for a course
    pub async fn find_config(&self, course_id: i64) -> Result<Option<CertificateConfig>, AdmissioError> {
        let config = sqlx::query_as::<_, CertificateConfig>(
            "SELECT id, course_id, background_image_url, background_image_width, background_image_height, title, subtitle, signature_line, created_at, updated_at FROM certificate_configs WHERE course_id = $1"
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Create or replace the certificate layout config for a course
    pub async fn upsert_config(&self, request: UpsertCertificateConfigRequest) -> Result<CertificateConfig, AdmissioError> {
        let config = sqlx::query_as::<_, CertificateConfig>(
            r#"
            INSERT INTO certificate_configs (course_id, background_image_url, background_image_width, background_image_height, title, subtitle, signature_line, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (course_id) DO UPDATE
            SET background_image_url = EXCLUDED.background_image_url,
                background_image_width = EXCLUDED.background_image_width,
                background_image_height = EXCLUDED.background_image_height,
                title = EXCLUDED.title,
                subtitle = EXCLUDED.subtitle,
                signature_line = EXCLUDED.signature_line,
                updated_at = EXCLUDED.updated_at
            RETURNING id, course_id, background_image_url, background_image_width, background_image_height, title, subtitle, signature_line, created_at, updated_at
            "#
        )
        .bind(request.course_id)
        .bind(request.background_image_url)
        .bind(request.background_image_width)
        .bind(request.background_image_height)
        .bind(request.title)
        .bind(request.subtitle)
        .bind(request.signature_line)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(config)
    }
}
