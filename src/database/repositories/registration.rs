//! Registration repository implementation
//!
//! Registrations plus their per-step data, uploaded documents and
//! evaluation submissions.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::registration::{
    Registration, CreateRegistrationRequest, UpdateRegistrationRequest,
    RegistrationData, RegistrationDocument, RegistrationDocumentDetail,
    RegistrationEvaluation,
};
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new registration
    pub async fn create(&self, request: CreateRegistrationRequest) -> Result<Registration, AdmissioError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (process_id, user_id, status, current_step_id, created_at, updated_at)
            VALUES ($1, $2, 'in_progress', $3, $4, $5)
            RETURNING id, process_id, user_id, status, current_step_id, created_at, updated_at, submitted_at
            "#
        )
        .bind(request.process_id)
        .bind(request.user_id)
        .bind(request.current_step_id)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find registration by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Registration>, AdmissioError> {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT id, process_id, user_id, status, current_step_id, created_at, updated_at, submitted_at FROM registrations WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Find the registration a user holds for a process, if any
    pub async fn find_by_user_and_process(&self, user_id: &str, process_id: i64) -> Result<Option<Registration>, AdmissioError> {
        let registration = sqlx::query_as::<_, Registration>(
            "SELECT id, process_id, user_id, status, current_step_id, created_at, updated_at, submitted_at FROM registrations WHERE user_id = $1 AND process_id = $2"
        )
        .bind(user_id)
        .bind(process_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(registration)
    }

    /// List registrations, optionally filtered by user and process
    pub async fn list(&self, user_id: Option<&str>, process_id: Option<i64>) -> Result<Vec<Registration>, AdmissioError> {
        let registrations = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, process_id, user_id, status, current_step_id, created_at, updated_at, submitted_at
            FROM registrations
            WHERE ($1::text IS NULL OR user_id = $1)
              AND ($2::bigint IS NULL OR process_id = $2)
            ORDER BY created_at DESC
            "#
        )
        .bind(user_id)
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Update registration status, current step and submission time
    pub async fn update(&self, id: i64, request: UpdateRegistrationRequest) -> Result<Registration, AdmissioError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET status = COALESCE($2, status),
                current_step_id = COALESCE($3, current_step_id),
                submitted_at = COALESCE($4, submitted_at),
                updated_at = $5
            WHERE id = $1
            RETURNING id, process_id, user_id, status, current_step_id, created_at, updated_at, submitted_at
            "#
        )
        .bind(id)
        .bind(request.status)
        .bind(request.current_step_id)
        .bind(request.submitted_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Fetch saved form data, optionally restricted to one step
    pub async fn list_data(&self, registration_id: i64, step_id: Option<i64>) -> Result<Vec<RegistrationData>, AdmissioError> {
        let data = sqlx::query_as::<_, RegistrationData>(
            r#"
            SELECT id, registration_id, step_id, field_name, field_value, created_at, updated_at
            FROM registration_data
            WHERE registration_id = $1
              AND ($2::bigint IS NULL OR step_id = $2)
            ORDER BY step_id, field_name
            "#
        )
        .bind(registration_id)
        .bind(step_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    /// Replace a step's saved form data in one transaction, last write wins
    pub async fn replace_step_data(
        &self,
        registration_id: i64,
        step_id: i64,
        entries: &[(String, Option<String>)],
    ) -> Result<Vec<RegistrationData>, AdmissioError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM registration_data WHERE registration_id = $1 AND step_id = $2")
            .bind(registration_id)
            .bind(step_id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        for (field_name, field_value) in entries {
            sqlx::query(
                "INSERT INTO registration_data (registration_id, step_id, field_name, field_value, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)"
            )
            .bind(registration_id)
            .bind(step_id)
            .bind(field_name)
            .bind(field_value)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.list_data(registration_id, Some(step_id)).await
    }

    /// Record an uploaded document
    pub async fn insert_document(
        &self,
        registration_id: i64,
        document_id: i64,
        file_path: &str,
        file_name: &str,
        file_size: i64,
        mime_type: Option<&str>,
    ) -> Result<RegistrationDocument, AdmissioError> {
        let document = sqlx::query_as::<_, RegistrationDocument>(
            r#"
            INSERT INTO registration_documents (registration_id, document_id, file_path, file_name, file_size, mime_type, status, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING id, registration_id, document_id, file_path, file_name, file_size, mime_type, status, rejection_reason, uploaded_at, reviewed_at
            "#
        )
        .bind(registration_id)
        .bind(document_id)
        .bind(file_path)
        .bind(file_name)
        .bind(file_size)
        .bind(mime_type)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    /// List uploaded documents with their requirement names, newest first
    pub async fn list_documents(&self, registration_id: i64) -> Result<Vec<RegistrationDocumentDetail>, AdmissioError> {
        let documents = sqlx::query_as::<_, RegistrationDocumentDetail>(
            r#"
            SELECT rd.id, rd.registration_id, rd.document_id, rd.file_path, rd.file_name, rd.file_size,
                   rd.mime_type, rd.status, rd.rejection_reason, rd.uploaded_at, rd.reviewed_at,
                   sd.name AS document_name, sd.description AS document_description
            FROM registration_documents rd
            JOIN step_documents sd ON rd.document_id = sd.id
            WHERE rd.registration_id = $1
            ORDER BY rd.uploaded_at DESC
            "#
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    /// Record a review decision on an uploaded document
    pub async fn review_document(
        &self,
        registration_id: i64,
        uploaded_document_id: i64,
        status: &str,
        rejection_reason: Option<&str>,
    ) -> Result<Option<RegistrationDocument>, AdmissioError> {
        let document = sqlx::query_as::<_, RegistrationDocument>(
            r#"
            UPDATE registration_documents
            SET status = $3, rejection_reason = $4, reviewed_at = $5
            WHERE id = $2 AND registration_id = $1
            RETURNING id, registration_id, document_id, file_path, file_name, file_size, mime_type, status, rejection_reason, uploaded_at, reviewed_at
            "#
        )
        .bind(registration_id)
        .bind(uploaded_document_id)
        .bind(status)
        .bind(rejection_reason)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Fetch evaluation submissions for a registration
    pub async fn list_evaluations(&self, registration_id: i64) -> Result<Vec<RegistrationEvaluation>, AdmissioError> {
        let evaluations = sqlx::query_as::<_, RegistrationEvaluation>(
            r#"
            SELECT id, registration_id, evaluation_id, answers, score, status, completed_at, created_at, updated_at
            FROM registration_evaluations
            WHERE registration_id = $1
            ORDER BY created_at
            "#
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(evaluations)
    }

    /// Store an evaluation submission, replacing any earlier attempt
    pub async fn upsert_evaluation(
        &self,
        registration_id: i64,
        evaluation_id: i64,
        answers: &serde_json::Value,
        score: Option<f64>,
        status: &str,
    ) -> Result<RegistrationEvaluation, AdmissioError> {
        let existing = sqlx::query_as::<_, RegistrationEvaluation>(
            "SELECT id, registration_id, evaluation_id, answers, score, status, completed_at, created_at, updated_at FROM registration_evaluations WHERE registration_id = $1 AND evaluation_id = $2"
        )
        .bind(registration_id)
        .bind(evaluation_id)
        .fetch_optional(&self.pool)
        .await?;

        let now = Utc::now();
        let completed_at = if status == "completed" { Some(now) } else { None };

        let evaluation = match existing {
            Some(previous) => {
                sqlx::query_as::<_, RegistrationEvaluation>(
                    r#"
                    UPDATE registration_evaluations
                    SET answers = $2, score = $3, status = $4, completed_at = $5, updated_at = $6
                    WHERE id = $1
                    RETURNING id, registration_id, evaluation_id, answers, score, status, completed_at, created_at, updated_at
                    "#
                )
                .bind(previous.id)
                .bind(answers)
                .bind(score)
                .bind(status)
                .bind(completed_at)
                .bind(now)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, RegistrationEvaluation>(
                    r#"
                    INSERT INTO registration_evaluations (registration_id, evaluation_id, answers, score, status, completed_at, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING id, registration_id, evaluation_id, answers, score, status, completed_at, created_at, updated_at
                    "#
                )
                .bind(registration_id)
                .bind(evaluation_id)
                .bind(answers)
                .bind(score)
                .bind(status)
                .bind(completed_at)
                .bind(now)
                .bind(now)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(evaluation)
    }
}
