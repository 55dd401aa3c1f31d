//! Admission step models
//!
//! A process is an ordered sequence of steps. Each step carries its own
//! configuration: form fields, required documents, or an evaluation with
//! modules and questions.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The kind of stage a step represents within the admission flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    BasicData,
    ComplementaryData,
    Address,
    Documents,
    Evaluation,
    Payment,
    Contract,
    Instructions,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::BasicData => "basic_data",
            StepType::ComplementaryData => "complementary_data",
            StepType::Address => "address",
            StepType::Documents => "documents",
            StepType::Evaluation => "evaluation",
            StepType::Payment => "payment",
            StepType::Contract => "contract",
            StepType::Instructions => "instructions",
        }
    }

    pub fn parse(value: &str) -> Option<StepType> {
        match value {
            "basic_data" => Some(StepType::BasicData),
            "complementary_data" => Some(StepType::ComplementaryData),
            "address" => Some(StepType::Address),
            "documents" => Some(StepType::Documents),
            "evaluation" => Some(StepType::Evaluation),
            "payment" => Some(StepType::Payment),
            "contract" => Some(StepType::Contract),
            "instructions" => Some(StepType::Instructions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdmissionStep {
    pub id: i64,
    pub process_id: i64,
    pub step_type: String,
    pub name: String,
    pub order_index: i32,
    pub is_required: bool,
    pub config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStepRequest {
    pub process_id: i64,
    pub step_type: String,
    pub name: String,
    pub order_index: i32,
    pub is_required: Option<bool>,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStepRequest {
    pub step_type: Option<String>,
    pub name: Option<String>,
    pub order_index: Option<i32>,
    pub is_required: Option<bool>,
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepField {
    pub id: i64,
    pub step_id: i64,
    pub field_name: String,
    pub field_label: String,
    pub field_type: String,
    pub is_required: bool,
    pub options: Option<serde_json::Value>,
    pub validation_rules: Option<serde_json::Value>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFieldRequest {
    pub field_name: String,
    pub field_label: String,
    pub field_type: String,
    pub is_required: Option<bool>,
    pub options: Option<serde_json::Value>,
    pub validation_rules: Option<serde_json::Value>,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFieldRequest {
    pub field_label: Option<String>,
    pub field_type: Option<String>,
    pub is_required: Option<bool>,
    pub options: Option<serde_json::Value>,
    pub validation_rules: Option<serde_json::Value>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepDocument {
    pub id: i64,
    pub step_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub accepted_formats: Option<serde_json::Value>,
    pub max_size_mb: i32,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl StepDocument {
    /// Accepted file extensions, defaulting to pdf/jpg/png when unset
    pub fn accepted_extensions(&self) -> Vec<String> {
        self.accepted_formats
            .as_ref()
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_lowercase())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec!["pdf".to_string(), "jpg".to_string(), "png".to_string()])
    }

    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb.max(1) as u64) * 1024 * 1024
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStepDocumentRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_required: Option<bool>,
    pub accepted_formats: Option<serde_json::Value>,
    pub max_size_mb: Option<i32>,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStepDocumentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_required: Option<bool>,
    pub accepted_formats: Option<serde_json::Value>,
    pub max_size_mb: Option<i32>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepEvaluation {
    pub id: i64,
    pub step_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub evaluation_type: String,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub time_limit_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvaluationRequest {
    pub name: String,
    pub description: Option<String>,
    pub evaluation_type: String,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub time_limit_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvaluationRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub evaluation_type: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    pub time_limit_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationModule {
    pub id: i64,
    pub evaluation_id: i64,
    pub name: String,
    pub content: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModuleRequest {
    pub name: String,
    pub content: Option<String>,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationQuestion {
    pub id: i64,
    pub evaluation_id: i64,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<serde_json::Value>,
    pub correct_answer: Option<String>,
    pub points: f64,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    pub question_text: String,
    pub question_type: Option<String>,
    pub options: Option<serde_json::Value>,
    pub correct_answer: Option<String>,
    pub points: Option<f64>,
    pub order_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_round_trip() {
        for value in [
            "basic_data",
            "complementary_data",
            "address",
            "documents",
            "evaluation",
            "payment",
            "contract",
            "instructions",
        ] {
            let parsed = StepType::parse(value).unwrap();
            assert_eq!(parsed.as_str(), value);
        }
        assert!(StepType::parse("interview").is_none());
    }

    #[test]
    fn test_accepted_extensions_default() {
        let doc = StepDocument {
            id: 1,
            step_id: 1,
            name: "ID".to_string(),
            description: None,
            is_required: true,
            accepted_formats: None,
            max_size_mb: 10,
            order_index: 0,
            created_at: Utc::now(),
        };
        assert_eq!(doc.accepted_extensions(), vec!["pdf", "jpg", "png"]);
        assert_eq!(doc.max_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_accepted_extensions_from_config() {
        let doc = StepDocument {
            id: 1,
            step_id: 1,
            name: "Photo".to_string(),
            description: None,
            is_required: true,
            accepted_formats: Some(serde_json::json!(["JPG", "png"])),
            max_size_mb: 2,
            order_index: 0,
            created_at: Utc::now(),
        };
        assert_eq!(doc.accepted_extensions(), vec!["jpg", "png"]);
    }
}
