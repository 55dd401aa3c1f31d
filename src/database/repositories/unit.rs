//! Unit repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::unit::{Unit, CreateUnitRequest, UpdateUnitRequest};
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct UnitRepository {
    pool: PgPool,
}

impl UnitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new unit
    pub async fn create(&self, request: CreateUnitRequest) -> Result<Unit, AdmissioError> {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            INSERT INTO units (course_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, course_id, name, description, created_at, updated_at
            "#
        )
        .bind(request.course_id)
        .bind(request.name)
        .bind(request.description)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Find unit by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Unit>, AdmissioError> {
        let unit = sqlx::query_as::<_, Unit>(
            "SELECT id, course_id, name, description, created_at, updated_at FROM units WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// List units, optionally restricted to a course
    pub async fn list(&self, course_id: Option<i64>) -> Result<Vec<Unit>, AdmissioError> {
        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT id, course_id, name, description, created_at, updated_at
            FROM units
            WHERE ($1::bigint IS NULL OR course_id = $1)
            ORDER BY name
            "#
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    /// Update unit
    pub async fn update(&self, id: i64, request: UpdateUnitRequest) -> Result<Unit, AdmissioError> {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING id, course_id, name, description, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Delete unit (cascades to admission processes)
    pub async fn delete(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
