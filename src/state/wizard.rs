//! Admission flow state machine
//!
//! A wizard is built from a process's ordered steps and enforces the
//! progression rules: entry at the first step, forward movement one step
//! at a time (optional steps may be skipped), and free backward movement.
//! It also validates submitted form values against the step's field
//! definitions.

use serde::{Deserialize, Serialize};
use crate::models::step::{AdmissionStep, StepField, StepType};
use crate::utils::errors::{AdmissioError, Result};

/// One position in the admission flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardStep {
    pub id: i64,
    pub step_type: StepType,
    pub name: String,
    pub order_index: i32,
    pub is_required: bool,
}

/// Declarative validation rules attached to a form field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub error_message: Option<String>,
}

/// State machine over one process's ordered steps
#[derive(Debug, Clone)]
pub struct AdmissionWizard {
    steps: Vec<WizardStep>,
}

impl AdmissionWizard {
    /// Build a wizard from the process's steps, ordered by their index
    pub fn new(steps: &[AdmissionStep]) -> Result<Self> {
        let mut wizard_steps = Vec::with_capacity(steps.len());
        for step in steps {
            let step_type = StepType::parse(&step.step_type).ok_or_else(|| {
                AdmissioError::InvalidInput(format!("Unknown step type: {}", step.step_type))
            })?;
            wizard_steps.push(WizardStep {
                id: step.id,
                step_type,
                name: step.name.clone(),
                order_index: step.order_index,
                is_required: step.is_required,
            });
        }
        wizard_steps.sort_by_key(|s| s.order_index);

        Ok(Self { steps: wizard_steps })
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    /// Entry point of the flow
    pub fn first_step(&self) -> Option<&WizardStep> {
        self.steps.first()
    }

    /// Whether the given step closes the flow
    pub fn is_last(&self, step_id: i64) -> bool {
        self.steps.last().map(|s| s.id == step_id).unwrap_or(false)
    }

    pub fn find(&self, step_id: i64) -> Option<&WizardStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Validate moving from the current position to another step.
    ///
    /// Backward movement is always allowed; forward movement must not skip
    /// a required step.
    pub fn validate_transition(&self, current_step_id: Option<i64>, next_step_id: i64) -> Result<()> {
        let next_index = self
            .position(next_step_id)
            .ok_or(AdmissioError::StepNotFound { step_id: next_step_id })?;

        let current_index = match current_step_id {
            Some(current_id) => {
                let index = self
                    .position(current_id)
                    .ok_or(AdmissioError::StepNotFound { step_id: current_id })?;

                // Backward movement revisits an already seen step
                if next_index <= index {
                    return Ok(());
                }
                index as i64
            }
            None => -1,
        };

        let skipped_required = self.steps[(current_index + 1) as usize..next_index]
            .iter()
            .find(|s| s.is_required);

        if let Some(skipped) = skipped_required {
            return Err(AdmissioError::InvalidStepTransition {
                from: self.step_name(current_step_id),
                to: format!("{} (skips required step {})", self.steps[next_index].name, skipped.name),
            });
        }

        Ok(())
    }

    fn position(&self, step_id: i64) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    fn step_name(&self, step_id: Option<i64>) -> String {
        step_id
            .and_then(|id| self.find(id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "start".to_string())
    }
}

/// Validate one step's submitted values against its field definitions
pub fn validate_step_fields(
    fields: &[StepField],
    data: &serde_json::Map<String, serde_json::Value>,
) -> Result<()> {
    for field in fields {
        let value = data.get(&field.field_name).map(value_text);

        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            if field.is_required {
                return Err(AdmissioError::InvalidInput(format!(
                    "Missing required field: {}",
                    field.field_name
                )));
            }
            continue;
        };

        if let Some(rules_json) = &field.validation_rules {
            let rules: FieldRules = serde_json::from_value(rules_json.clone())
                .map_err(|e| AdmissioError::Config(format!(
                    "Invalid validation rules for field {}: {}",
                    field.field_name, e
                )))?;
            validate_against_rules(&field.field_name, &value, &rules)?;
        }

        validate_field_type(field, &value)?;
    }

    Ok(())
}

fn validate_against_rules(field_name: &str, value: &str, rules: &FieldRules) -> Result<()> {
    let fail = |fallback: String| {
        AdmissioError::InvalidInput(rules.error_message.clone().unwrap_or(fallback))
    };

    if let Some(min_length) = rules.min_length {
        if value.chars().count() < min_length {
            return Err(fail(format!("{} is too short (minimum {} characters)", field_name, min_length)));
        }
    }

    if let Some(max_length) = rules.max_length {
        if value.chars().count() > max_length {
            return Err(fail(format!("{} is too long (maximum {} characters)", field_name, max_length)));
        }
    }

    if let Some(pattern) = &rules.pattern {
        let regex = regex::Regex::new(pattern)
            .map_err(|_| AdmissioError::Config(format!("Invalid regex pattern for field {}", field_name)))?;
        if !regex.is_match(value) {
            return Err(fail(format!("{} has an invalid format", field_name)));
        }
    }

    Ok(())
}

fn validate_field_type(field: &StepField, value: &str) -> Result<()> {
    match field.field_type.as_str() {
        "email" => {
            if !value.contains('@') || !value.contains('.') {
                return Err(AdmissioError::InvalidInput(format!(
                    "{} must be a valid email", field.field_name
                )));
            }
        }
        "number" => {
            if value.parse::<f64>().is_err() {
                return Err(AdmissioError::InvalidInput(format!(
                    "{} must be a number", field.field_name
                )));
            }
        }
        "date" => {
            if chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                return Err(AdmissioError::InvalidInput(format!(
                    "{} must be a date (YYYY-MM-DD)", field.field_name
                )));
            }
        }
        "cep" => {
            if !crate::utils::helpers::is_valid_cep_format(value) {
                return Err(AdmissioError::InvalidInput(format!(
                    "{} must be an 8-digit CEP", field.field_name
                )));
            }
        }
        "select" => {
            let allowed: Vec<String> = field
                .options
                .as_ref()
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if !allowed.is_empty() && !allowed.iter().any(|option| option == value) {
                return Err(AdmissioError::InvalidInput(format!(
                    "{} must be one of: {}",
                    field.field_name,
                    allowed.join(", ")
                )));
            }
        }
        _ => {}
    }

    Ok(())
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn step(id: i64, step_type: &str, order_index: i32, is_required: bool) -> AdmissionStep {
        AdmissionStep {
            id,
            process_id: 1,
            step_type: step_type.to_string(),
            name: format!("Step {}", id),
            order_index,
            is_required,
            config: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn field(name: &str, field_type: &str, required: bool, rules: Option<serde_json::Value>) -> StepField {
        StepField {
            id: 1,
            step_id: 1,
            field_name: name.to_string(),
            field_label: name.to_string(),
            field_type: field_type.to_string(),
            is_required: required,
            options: None,
            validation_rules: rules,
            order_index: 0,
            created_at: Utc::now(),
        }
    }

    fn wizard() -> AdmissionWizard {
        AdmissionWizard::new(&[
            step(10, "basic_data", 0, true),
            step(20, "address", 1, true),
            step(30, "instructions", 2, false),
            step(40, "documents", 3, true),
            step(50, "contract", 4, true),
        ])
        .unwrap()
    }

    #[test]
    fn test_entry_is_first_step() {
        let w = wizard();
        assert_eq!(w.first_step().unwrap().id, 10);
        assert!(w.validate_transition(None, 10).is_ok());
        assert!(w.validate_transition(None, 20).is_err());
    }

    #[test]
    fn test_forward_one_step_allowed() {
        let w = wizard();
        assert!(w.validate_transition(Some(10), 20).is_ok());
        assert!(w.validate_transition(Some(20), 30).is_ok());
    }

    #[test]
    fn test_skipping_required_step_rejected() {
        let w = wizard();
        let err = w.validate_transition(Some(10), 40).unwrap_err();
        assert!(matches!(err, AdmissioError::InvalidStepTransition { .. }));
    }

    #[test]
    fn test_skipping_optional_step_allowed() {
        let w = wizard();
        assert!(w.validate_transition(Some(20), 40).is_ok());
    }

    #[test]
    fn test_backward_movement_allowed() {
        let w = wizard();
        assert!(w.validate_transition(Some(40), 10).is_ok());
        assert!(w.validate_transition(Some(20), 20).is_ok());
    }

    #[test]
    fn test_unknown_step_rejected() {
        let w = wizard();
        assert_matches::assert_matches!(
            w.validate_transition(Some(10), 99),
            Err(AdmissioError::StepNotFound { step_id: 99 })
        );
    }

    #[test]
    fn test_unknown_step_type_rejected() {
        let result = AdmissionWizard::new(&[step(1, "interview", 0, true)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_last() {
        let w = wizard();
        assert!(w.is_last(50));
        assert!(!w.is_last(40));
    }

    #[test]
    fn test_steps_sorted_by_order_index() {
        let w = AdmissionWizard::new(&[
            step(2, "address", 1, true),
            step(1, "basic_data", 0, true),
        ])
        .unwrap();
        assert_eq!(w.first_step().unwrap().id, 1);
    }

    #[test]
    fn test_required_field_presence() {
        let fields = vec![field("nome", "text", true, None)];

        let empty = serde_json::Map::new();
        assert!(validate_step_fields(&fields, &empty).is_err());

        let mut data = serde_json::Map::new();
        data.insert("nome".to_string(), serde_json::json!("Maria"));
        assert!(validate_step_fields(&fields, &data).is_ok());
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let fields = vec![field("complemento", "text", false, None)];
        assert!(validate_step_fields(&fields, &serde_json::Map::new()).is_ok());
    }

    #[test]
    fn test_length_rules() {
        let rules = serde_json::json!({"min_length": 3, "max_length": 5});
        let fields = vec![field("apelido", "text", true, Some(rules))];

        let mut data = serde_json::Map::new();
        data.insert("apelido".to_string(), serde_json::json!("ab"));
        assert!(validate_step_fields(&fields, &data).is_err());

        data.insert("apelido".to_string(), serde_json::json!("abcd"));
        assert!(validate_step_fields(&fields, &data).is_ok());

        data.insert("apelido".to_string(), serde_json::json!("abcdef"));
        assert!(validate_step_fields(&fields, &data).is_err());
    }

    #[test]
    fn test_typed_field_checks() {
        let fields = vec![
            field("email", "email", true, None),
            field("idade", "number", true, None),
            field("nascimento", "date", true, None),
            field("cep", "cep", true, None),
        ];

        let mut data = serde_json::Map::new();
        data.insert("email".to_string(), serde_json::json!("a@b.com"));
        data.insert("idade".to_string(), serde_json::json!("21"));
        data.insert("nascimento".to_string(), serde_json::json!("2004-02-29"));
        data.insert("cep".to_string(), serde_json::json!("01310-100"));
        assert!(validate_step_fields(&fields, &data).is_ok());

        data.insert("email".to_string(), serde_json::json!("not-an-email"));
        assert!(validate_step_fields(&fields, &data).is_err());
    }

    #[test]
    fn test_custom_error_message() {
        let rules = serde_json::json!({"pattern": "^[0-9]+$", "error_message": "somente numeros"});
        let fields = vec![field("matricula", "text", true, Some(rules))];

        let mut data = serde_json::Map::new();
        data.insert("matricula".to_string(), serde_json::json!("abc"));
        let err = validate_step_fields(&fields, &data).unwrap_err();
        assert!(err.to_string().contains("somente numeros"));
    }
}
