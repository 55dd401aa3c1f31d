//! Admission process repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::process::{AdmissionProcess, CreateProcessRequest, UpdateProcessRequest};
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct ProcessRepository {
    pool: PgPool,
}

impl ProcessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new admission process
    pub async fn create(&self, request: CreateProcessRequest) -> Result<AdmissionProcess, AdmissioError> {
        let process = sqlx::query_as::<_, AdmissionProcess>(
            r#"
            INSERT INTO admission_processes (unit_id, name, description, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, unit_id, name, description, is_active, created_at, updated_at
            "#
        )
        .bind(request.unit_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.is_active.unwrap_or(true))
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(process)
    }

    /// Find process by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<AdmissionProcess>, AdmissioError> {
        let process = sqlx::query_as::<_, AdmissionProcess>(
            "SELECT id, unit_id, name, description, is_active, created_at, updated_at FROM admission_processes WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(process)
    }

    /// List processes filtered by unit and active flag
    pub async fn list(&self, unit_id: Option<i64>, active: Option<bool>) -> Result<Vec<AdmissionProcess>, AdmissioError> {
        let processes = sqlx::query_as::<_, AdmissionProcess>(
            r#"
            SELECT id, unit_id, name, description, is_active, created_at, updated_at
            FROM admission_processes
            WHERE ($1::bigint IS NULL OR unit_id = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            "#
        )
        .bind(unit_id)
        .bind(active)
        .fetch_all(&self.pool)
        .await?;

        Ok(processes)
    }

    /// Update process
    pub async fn update(&self, id: i64, request: UpdateProcessRequest) -> Result<AdmissionProcess, AdmissioError> {
        let process = sqlx::query_as::<_, AdmissionProcess>(
            r#"
            UPDATE admission_processes
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = $5
            WHERE id = $1
            RETURNING id, unit_id, name, description, is_active, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.is_active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(process)
    }

    /// Delete process (cascades to steps and registrations)
    pub async fn delete(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM admission_processes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
