//! Course repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::course::{Course, CreateCourseRequest, UpdateCourseRequest};
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new course
    pub async fn create(&self, request: CreateCourseRequest) -> Result<Course, AdmissioError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (name, description, image_url, course_type, modality, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, image_url, course_type, modality, created_at, updated_at
            "#
        )
        .bind(request.name)
        .bind(request.description)
        .bind(request.image_url)
        .bind(request.course_type)
        .bind(request.modality)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    /// Find course by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Course>, AdmissioError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, name, description, image_url, course_type, modality, created_at, updated_at FROM courses WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    /// List courses, optionally filtered by type and modality
    pub async fn list(&self, course_type: Option<&str>, modality: Option<&str>) -> Result<Vec<Course>, AdmissioError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, name, description, image_url, course_type, modality, created_at, updated_at
            FROM courses
            WHERE ($1::text IS NULL OR course_type = $1)
              AND ($2::text IS NULL OR modality = $2)
            ORDER BY created_at DESC
            "#
        )
        .bind(course_type)
        .bind(modality)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    /// Update course
    pub async fn update(&self, id: i64, request: UpdateCourseRequest) -> Result<Course, AdmissioError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                course_type = COALESCE($5, course_type),
                modality = COALESCE($6, modality),
                updated_at = $7
            WHERE id = $1
            RETURNING id, name, description, image_url, course_type, modality, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.image_url)
        .bind(request.course_type)
        .bind(request.modality)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    /// Delete course (cascades to units and processes)
    pub async fn delete(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
