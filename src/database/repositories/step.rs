//! Admission step repository implementation
//!
//! Covers the step rows themselves plus their attached catalog content:
//! form fields, required documents, evaluations, evaluation modules and
//! questions.

use sqlx::PgPool;
use chrono::Utc;
use crate::models::step::{
    AdmissionStep, CreateStepRequest, UpdateStepRequest,
    StepField, CreateFieldRequest, UpdateFieldRequest,
    StepDocument, CreateStepDocumentRequest, UpdateStepDocumentRequest,
    StepEvaluation, CreateEvaluationRequest, UpdateEvaluationRequest,
    EvaluationModule, CreateModuleRequest,
    EvaluationQuestion, CreateQuestionRequest,
};
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct StepRepository {
    pool: PgPool,
}

impl StepRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new step
    pub async fn create(&self, request: CreateStepRequest) -> Result<AdmissionStep, AdmissioError> {
        let step = sqlx::query_as::<_, AdmissionStep>(
            r#"
            INSERT INTO admission_steps (process_id, step_type, name, order_index, is_required, config, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, process_id, step_type, name, order_index, is_required, config, created_at, updated_at
            "#
        )
        .bind(request.process_id)
        .bind(request.step_type)
        .bind(request.name)
        .bind(request.order_index)
        .bind(request.is_required.unwrap_or(true))
        .bind(request.config)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(step)
    }

    /// Find step by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<AdmissionStep>, AdmissioError> {
        let step = sqlx::query_as::<_, AdmissionStep>(
            "SELECT id, process_id, step_type, name, order_index, is_required, config, created_at, updated_at FROM admission_steps WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(step)
    }

    /// List the steps of a process in wizard order
    pub async fn list_by_process(&self, process_id: i64) -> Result<Vec<AdmissionStep>, AdmissioError> {
        let steps = sqlx::query_as::<_, AdmissionStep>(
            r#"
            SELECT id, process_id, step_type, name, order_index, is_required, config, created_at, updated_at
            FROM admission_steps
            WHERE process_id = $1
            ORDER BY order_index
            "#
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(steps)
    }

    /// Update step
    pub async fn update(&self, id: i64, request: UpdateStepRequest) -> Result<AdmissionStep, AdmissioError> {
        let step = sqlx::query_as::<_, AdmissionStep>(
            r#"
            UPDATE admission_steps
            SET step_type = COALESCE($2, step_type),
                name = COALESCE($3, name),
                order_index = COALESCE($4, order_index),
                is_required = COALESCE($5, is_required),
                config = COALESCE($6, config),
                updated_at = $7
            WHERE id = $1
            RETURNING id, process_id, step_type, name, order_index, is_required, config, created_at, updated_at
            "#
        )
        .bind(id)
        .bind(request.step_type)
        .bind(request.name)
        .bind(request.order_index)
        .bind(request.is_required)
        .bind(request.config)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(step)
    }

    /// Delete step (cascades to fields, documents and evaluations)
    pub async fn delete(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM admission_steps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List form fields of a step in display order
    pub async fn list_fields(&self, step_id: i64) -> Result<Vec<StepField>, AdmissioError> {
        let fields = sqlx::query_as::<_, StepField>(
            r#"
            SELECT id, step_id, field_name, field_label, field_type, is_required, options, validation_rules, order_index, created_at
            FROM step_fields
            WHERE step_id = $1
            ORDER BY order_index
            "#
        )
        .bind(step_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fields)
    }

    /// Attach a form field to a step
    pub async fn create_field(&self, step_id: i64, request: CreateFieldRequest) -> Result<StepField, AdmissioError> {
        let field = sqlx::query_as::<_, StepField>(
            r#"
            INSERT INTO step_fields (step_id, field_name, field_label, field_type, is_required, options, validation_rules, order_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, step_id, field_name, field_label, field_type, is_required, options, validation_rules, order_index, created_at
            "#
        )
        .bind(step_id)
        .bind(request.field_name)
        .bind(request.field_label)
        .bind(request.field_type)
        .bind(request.is_required.unwrap_or(false))
        .bind(request.options)
        .bind(request.validation_rules)
        .bind(request.order_index)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(field)
    }

    /// Update a form field
    pub async fn update_field(&self, id: i64, request: UpdateFieldRequest) -> Result<StepField, AdmissioError> {
        let field = sqlx::query_as::<_, StepField>(
            r#"
            UPDATE step_fields
            SET field_label = COALESCE($2, field_label),
                field_type = COALESCE($3, field_type),
                is_required = COALESCE($4, is_required),
                options = COALESCE($5, options),
                validation_rules = COALESCE($6, validation_rules),
                order_index = COALESCE($7, order_index)
            WHERE id = $1
            RETURNING id, step_id, field_name, field_label, field_type, is_required, options, validation_rules, order_index, created_at
            "#
        )
        .bind(id)
        .bind(request.field_label)
        .bind(request.field_type)
        .bind(request.is_required)
        .bind(request.options)
        .bind(request.validation_rules)
        .bind(request.order_index)
        .fetch_one(&self.pool)
        .await?;

        Ok(field)
    }

    /// Delete a form field
    pub async fn delete_field(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM step_fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List the document requirements of a step
    pub async fn list_documents(&self, step_id: i64) -> Result<Vec<StepDocument>, AdmissioError> {
        let documents = sqlx::query_as::<_, StepDocument>(
            r#"
            SELECT id, step_id, name, description, is_required, accepted_formats, max_size_mb, order_index, created_at
            FROM step_documents
            WHERE step_id = $1
            ORDER BY order_index
            "#
        )
        .bind(step_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    /// Find a document requirement by ID
    pub async fn find_document(&self, id: i64) -> Result<Option<StepDocument>, AdmissioError> {
        let document = sqlx::query_as::<_, StepDocument>(
            "SELECT id, step_id, name, description, is_required, accepted_formats, max_size_mb, order_index, created_at FROM step_documents WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    /// Attach a document requirement to a step
    pub async fn create_document(&self, step_id: i64, request: CreateStepDocumentRequest) -> Result<StepDocument, AdmissioError> {
        let document = sqlx::query_as::<_, StepDocument>(
            r#"
            INSERT INTO step_documents (step_id, name, description, is_required, accepted_formats, max_size_mb, order_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, step_id, name, description, is_required, accepted_formats, max_size_mb, order_index, created_at
            "#
        )
        .bind(step_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.is_required.unwrap_or(true))
        .bind(request.accepted_formats)
        .bind(request.max_size_mb.unwrap_or(10))
        .bind(request.order_index)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    /// Update a document requirement
    pub async fn update_document(&self, id: i64, request: UpdateStepDocumentRequest) -> Result<StepDocument, AdmissioError> {
        let document = sqlx::query_as::<_, StepDocument>(
            r#"
            UPDATE step_documents
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_required = COALESCE($4, is_required),
                accepted_formats = COALESCE($5, accepted_formats),
                max_size_mb = COALESCE($6, max_size_mb),
                order_index = COALESCE($7, order_index)
            WHERE id = $1
            RETURNING id, step_id, name, description, is_required, accepted_formats, max_size_mb, order_index, created_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.is_required)
        .bind(request.accepted_formats)
        .bind(request.max_size_mb)
        .bind(request.order_index)
        .fetch_one(&self.pool)
        .await?;

        Ok(document)
    }

    /// Delete a document requirement
    pub async fn delete_document(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM step_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List the evaluations of a step
    pub async fn list_evaluations(&self, step_id: i64) -> Result<Vec<StepEvaluation>, AdmissioError> {
        let evaluations = sqlx::query_as::<_, StepEvaluation>(
            r#"
            SELECT id, step_id, name, description, evaluation_type, location, scheduled_at, instructions, time_limit_minutes, created_at
            FROM step_evaluations
            WHERE step_id = $1
            ORDER BY created_at
            "#
        )
        .bind(step_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(evaluations)
    }

    /// Find an evaluation by ID
    pub async fn find_evaluation(&self, id: i64) -> Result<Option<StepEvaluation>, AdmissioError> {
        let evaluation = sqlx::query_as::<_, StepEvaluation>(
            "SELECT id, step_id, name, description, evaluation_type, location, scheduled_at, instructions, time_limit_minutes, created_at FROM step_evaluations WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(evaluation)
    }

    /// Attach an evaluation to a step
    pub async fn create_evaluation(&self, step_id: i64, request: CreateEvaluationRequest) -> Result<StepEvaluation, AdmissioError> {
        let evaluation = sqlx::query_as::<_, StepEvaluation>(
            r#"
            INSERT INTO step_evaluations (step_id, name, description, evaluation_type, location, scheduled_at, instructions, time_limit_minutes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, step_id, name, description, evaluation_type, location, scheduled_at, instructions, time_limit_minutes, created_at
            "#
        )
        .bind(step_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.evaluation_type)
        .bind(request.location)
        .bind(request.scheduled_at)
        .bind(request.instructions)
        .bind(request.time_limit_minutes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(evaluation)
    }

    /// Update an evaluation
    pub async fn update_evaluation(&self, id: i64, request: UpdateEvaluationRequest) -> Result<StepEvaluation, AdmissioError> {
        let evaluation = sqlx::query_as::<_, StepEvaluation>(
            r#"
            UPDATE step_evaluations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                evaluation_type = COALESCE($4, evaluation_type),
                location = COALESCE($5, location),
                scheduled_at = COALESCE($6, scheduled_at),
                instructions = COALESCE($7, instructions),
                time_limit_minutes = COALESCE($8, time_limit_minutes)
            WHERE id = $1
            RETURNING id, step_id, name, description, evaluation_type, location, scheduled_at, instructions, time_limit_minutes, created_at
            "#
        )
        .bind(id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.evaluation_type)
        .bind(request.location)
        .bind(request.scheduled_at)
        .bind(request.instructions)
        .bind(request.time_limit_minutes)
        .fetch_one(&self.pool)
        .await?;

        Ok(evaluation)
    }

    /// Delete an evaluation
    pub async fn delete_evaluation(&self, id: i64) -> Result<(), AdmissioError> {
        sqlx::query("DELETE FROM step_evaluations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// List an evaluation's content modules in display order
    pub async fn list_modules(&self, evaluation_id: i64) -> Result<Vec<EvaluationModule>, AdmissioError> {
        let modules = sqlx::query_as::<_, EvaluationModule>(
            r#"
            SELECT id, evaluation_id, name, content, order_index, created_at
            FROM step_evaluation_modules
            WHERE evaluation_id = $1
            ORDER BY order_index
            "#
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(modules)
    }

    /// Add a content module to an evaluation
    pub async fn create_module(&self, evaluation_id: i64, request: CreateModuleRequest) -> Result<EvaluationModule, AdmissioError> {
        let module = sqlx::query_as::<_, EvaluationModule>(
            r#"
            INSERT INTO step_evaluation_modules (evaluation_id, name, content, order_index, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, evaluation_id, name, content, order_index, created_at
            "#
        )
        .bind(evaluation_id)
        .bind(request.name)
        .bind(request.content)
        .bind(request.order_index)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(module)
    }

    /// List an evaluation's questions in display order
    pub async fn list_questions(&self, evaluation_id: i64) -> Result<Vec<EvaluationQuestion>, AdmissioError> {
        let questions = sqlx::query_as::<_, EvaluationQuestion>(
            r#"
            SELECT id, evaluation_id, question_text, question_type, options, correct_answer, points, order_index, created_at
            FROM step_evaluation_questions
            WHERE evaluation_id = $1
            ORDER BY order_index
            "#
        )
        .bind(evaluation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }

    /// Add a question to an evaluation
    pub async fn create_question(&self, evaluation_id: i64, request: CreateQuestionRequest) -> Result<EvaluationQuestion, AdmissioError> {
        let question = sqlx::query_as::<_, EvaluationQuestion>(
            r#"
            INSERT INTO step_evaluation_questions (evaluation_id, question_text, question_type, options, correct_answer, points, order_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, evaluation_id, question_text, question_type, options, correct_answer, points, order_index, created_at
            "#
        )
        .bind(evaluation_id)
        .bind(request.question_text)
        .bind(request.question_type.unwrap_or_else(|| "multiple_choice".to_string()))
        .bind(request.options)
        .bind(request.correct_answer)
        .bind(request.points.unwrap_or(1.0))
        .bind(request.order_index)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }
}
