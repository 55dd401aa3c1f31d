//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{
    DatabasePool, CourseRepository, UnitRepository, ProcessRepository, StepRepository,
    RegistrationRepository, CertificateRepository,
};
use crate::models::*;
use crate::models::step::EvaluationQuestion;
use crate::utils::errors::AdmissioError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub courses: CourseRepository,
    pub units: UnitRepository,
    pub processes: ProcessRepository,
    pub steps: StepRepository,
    pub registrations: RegistrationRepository,
    pub certificates: CertificateRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            courses: CourseRepository::new(pool.clone()),
            units: UnitRepository::new(pool.clone()),
            processes: ProcessRepository::new(pool.clone()),
            steps: StepRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            certificates: CertificateRepository::new(pool),
        }
    }

    /// Start a registration for a user, returning the existing one when the
    /// user already applied to this process
    pub async fn initialize_registration(&self, request: CreateRegistrationRequest) -> Result<(Registration, bool), AdmissioError> {
        if self.processes.find_by_id(request.process_id).await?.is_none() {
            return Err(AdmissioError::ProcessNotFound { process_id: request.process_id });
        }

        if let Some(existing) = self
            .registrations
            .find_by_user_and_process(&request.user_id, request.process_id)
            .await?
        {
            return Ok((existing, false));
        }

        let registration = self.registrations.create(request).await?;
        Ok((registration, true))
    }

    /// Replace one step's saved form values for a registration
    pub async fn save_step_data(
        &self,
        registration_id: i64,
        request: SaveStepDataRequest,
    ) -> Result<Vec<RegistrationData>, AdmissioError> {
        if self.registrations.find_by_id(registration_id).await?.is_none() {
            return Err(AdmissioError::RegistrationNotFound { registration_id });
        }
        if self.steps.find_by_id(request.step_id).await?.is_none() {
            return Err(AdmissioError::StepNotFound { step_id: request.step_id });
        }

        let entries: Vec<(String, Option<String>)> = request
            .data
            .into_iter()
            .map(|(name, value)| (name, json_value_to_column(value)))
            .collect();

        self.registrations
            .replace_step_data(registration_id, request.step_id, &entries)
            .await
    }

    /// Review an uploaded document; rejection requires a reason
    pub async fn review_document(
        &self,
        registration_id: i64,
        uploaded_document_id: i64,
        request: ReviewDocumentRequest,
    ) -> Result<RegistrationDocument, AdmissioError> {
        let status = DocumentStatus::parse(&request.status)
            .ok_or_else(|| AdmissioError::InvalidInput(format!("Unknown document status: {}", request.status)))?;

        if status == DocumentStatus::Rejected && request.rejection_reason.as_deref().map_or(true, str::is_empty) {
            return Err(AdmissioError::InvalidInput(
                "rejection_reason is required when status is rejected".to_string(),
            ));
        }

        self.registrations
            .review_document(
                registration_id,
                uploaded_document_id,
                status.as_str(),
                request.rejection_reason.as_deref(),
            )
            .await?
            .ok_or(AdmissioError::DocumentNotFound { document_id: uploaded_document_id })
    }

    /// Store and grade an evaluation submission
    pub async fn submit_evaluation(
        &self,
        registration_id: i64,
        request: SubmitEvaluationRequest,
    ) -> Result<RegistrationEvaluation, AdmissioError> {
        if self.registrations.find_by_id(registration_id).await?.is_none() {
            return Err(AdmissioError::RegistrationNotFound { registration_id });
        }
        if self.steps.find_evaluation(request.evaluation_id).await?.is_none() {
            return Err(AdmissioError::EvaluationNotFound { evaluation_id: request.evaluation_id });
        }

        let questions = self.steps.list_questions(request.evaluation_id).await?;
        let answers = serde_json::Value::Object(request.answers);
        let grade = grade_submission(&questions, &answers);

        self.registrations
            .upsert_evaluation(
                registration_id,
                request.evaluation_id,
                &answers,
                grade.score,
                grade.status,
            )
            .await
    }
}

/// Outcome of auto-grading an evaluation submission
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub score: Option<f64>,
    pub status: &'static str,
}

/// Grade choice questions against their stored correct answer.
///
/// Essay questions cannot be auto-graded; their presence leaves the
/// submission waiting for manual review with the partial score of the
/// auto-gradable part.
pub fn grade_submission(questions: &[EvaluationQuestion], answers: &serde_json::Value) -> GradeOutcome {
    let empty = serde_json::Map::new();
    let answers = answers.as_object().unwrap_or(&empty);

    let mut score = 0.0;
    let mut has_essay = false;

    for question in questions {
        if question.question_type == "essay" {
            has_essay = true;
            continue;
        }

        let given = answers
            .get(&question.id.to_string())
            .map(answer_text);

        if let (Some(given), Some(expected)) = (given, question.correct_answer.as_deref()) {
            if given.trim() == expected.trim() {
                score += question.points;
            }
        }
    }

    if has_essay {
        GradeOutcome { score: Some(score), status: "pending_review" }
    } else {
        GradeOutcome { score: Some(score), status: "completed" }
    }
}

fn answer_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_value_to_column(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn question(id: i64, question_type: &str, correct: Option<&str>, points: f64) -> EvaluationQuestion {
        EvaluationQuestion {
            id,
            evaluation_id: 1,
            question_text: format!("Question {}", id),
            question_type: question_type.to_string(),
            options: None,
            correct_answer: correct.map(str::to_string),
            points,
            order_index: id as i32,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_grading_sums_correct_choice_answers() {
        let questions = vec![
            question(1, "multiple_choice", Some("b"), 2.0),
            question(2, "multiple_choice", Some("a"), 3.0),
            question(3, "true_false", Some("true"), 1.0),
        ];
        let answers = serde_json::json!({"1": "b", "2": "c", "3": "true"});

        let outcome = grade_submission(&questions, &answers);
        assert_eq!(outcome.score, Some(3.0));
        assert_eq!(outcome.status, "completed");
    }

    #[test]
    fn test_essay_forces_manual_review() {
        let questions = vec![
            question(1, "multiple_choice", Some("a"), 1.0),
            question(2, "essay", None, 5.0),
        ];
        let answers = serde_json::json!({"1": "a", "2": "my long answer"});

        let outcome = grade_submission(&questions, &answers);
        assert_eq!(outcome.score, Some(1.0));
        assert_eq!(outcome.status, "pending_review");
    }

    #[test]
    fn test_missing_answers_score_zero() {
        let questions = vec![question(1, "multiple_choice", Some("a"), 1.0)];
        let answers = serde_json::json!({});

        let outcome = grade_submission(&questions, &answers);
        assert_eq!(outcome.score, Some(0.0));
        assert_eq!(outcome.status, "completed");
    }

    #[test]
    fn test_non_string_answers_are_normalized() {
        let questions = vec![question(1, "multiple_choice", Some("42"), 1.0)];
        let answers = serde_json::json!({"1": 42});

        let outcome = grade_submission(&questions, &answers);
        assert_eq!(outcome.score, Some(1.0));
    }

    #[test]
    fn test_json_value_to_column() {
        assert_eq!(json_value_to_column(serde_json::Value::Null), None);
        assert_eq!(json_value_to_column(serde_json::json!("x")), Some("x".to_string()));
        assert_eq!(json_value_to_column(serde_json::json!({"a": 1})), Some("{\"a\":1}".to_string()));
    }
}
