//! Admission flow integration test
//!
//! Walks one applicant through a full process in memory: wizard
//! transitions across every step type, field validation, evaluation
//! grading, contract rendering and certificate generation with stored
//! artifacts.

use chrono::Utc;

use admissio::config::Settings;
use admissio::database::service::grade_submission;
use admissio::models::step::{AdmissionStep, EvaluationQuestion, StepField};
use admissio::services::certificate::{CertificateData, CertificateService};
use admissio::services::contract::{generate_contract_pdf, replace_contract_tags};
use admissio::services::UploadService;
use admissio::state::wizard::{validate_step_fields, AdmissionWizard};
use admissio::utils::helpers::generate_certificate_code;

fn step(id: i64, step_type: &str, order_index: i32, is_required: bool) -> AdmissionStep {
    AdmissionStep {
        id,
        process_id: 1,
        step_type: step_type.to_string(),
        name: step_type.replace('_', " "),
        order_index,
        is_required,
        config: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn full_process() -> Vec<AdmissionStep> {
    vec![
        step(1, "instructions", 0, false),
        step(2, "basic_data", 1, true),
        step(3, "address", 2, true),
        step(4, "documents", 3, true),
        step(5, "evaluation", 4, true),
        step(6, "payment", 5, true),
        step(7, "contract", 6, true),
    ]
}

#[test]
fn applicant_walks_the_whole_process() {
    let wizard = AdmissionWizard::new(&full_process()).unwrap();

    // instructions are optional, entry may land directly on basic data
    assert!(wizard.validate_transition(None, 1).is_ok());
    assert!(wizard.validate_transition(None, 2).is_ok());

    let mut current = 1;
    for next in [2, 3, 4, 5, 6, 7] {
        wizard.validate_transition(Some(current), next).unwrap();
        current = next;
    }
    assert!(wizard.is_last(current));

    // going back to fix the address mid-flow is allowed
    assert!(wizard.validate_transition(Some(6), 3).is_ok());
    // but payment cannot be reached skipping the evaluation
    assert!(wizard.validate_transition(Some(4), 6).is_err());
}

#[test]
fn basic_data_step_validates_fields() {
    let fields = vec![
        StepField {
            id: 1,
            step_id: 2,
            field_name: "nome".to_string(),
            field_label: "Nome completo".to_string(),
            field_type: "text".to_string(),
            is_required: true,
            options: None,
            validation_rules: Some(serde_json::json!({"min_length": 2, "max_length": 80})),
            order_index: 0,
            created_at: Utc::now(),
        },
        StepField {
            id: 2,
            step_id: 2,
            field_name: "email".to_string(),
            field_label: "E-mail".to_string(),
            field_type: "email".to_string(),
            is_required: true,
            options: None,
            validation_rules: None,
            order_index: 1,
            created_at: Utc::now(),
        },
    ];

    let mut data = serde_json::Map::new();
    data.insert("email".to_string(), serde_json::json!("maria@example.com"));
    // missing required field fails
    assert!(validate_step_fields(&fields, &data).is_err());

    data.insert("nome".to_string(), serde_json::json!("Maria Silva"));
    assert!(validate_step_fields(&fields, &data).is_ok());
}

#[test]
fn evaluation_is_graded_on_submission() {
    let questions = vec![
        EvaluationQuestion {
            id: 1,
            evaluation_id: 1,
            question_text: "2 + 2?".to_string(),
            question_type: "multiple_choice".to_string(),
            options: Some(serde_json::json!(["3", "4", "5"])),
            correct_answer: Some("4".to_string()),
            points: 2.0,
            order_index: 0,
            created_at: Utc::now(),
        },
        EvaluationQuestion {
            id: 2,
            evaluation_id: 1,
            question_text: "A Terra é plana?".to_string(),
            question_type: "true_false".to_string(),
            options: None,
            correct_answer: Some("false".to_string()),
            points: 1.0,
            order_index: 1,
            created_at: Utc::now(),
        },
    ];

    let answers = serde_json::json!({"1": "4", "2": "true"});
    let outcome = grade_submission(&questions, &answers);
    assert_eq!(outcome.score, Some(2.0));
    assert_eq!(outcome.status, "completed");
}

#[tokio::test]
async fn contract_is_rendered_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.storage.uploads_dir = dir.path().to_string_lossy().to_string();
    let uploads = UploadService::new(settings);

    let template = "CONTRATO DE INSCRIÇÃO\n\nCláusula 1 - Identificação\nEu, {{nome}}{{#cpf}}, CPF {{cpf}}{{/cpf}}, aceito os termos.\n\nAssinado em {{data}}.";
    let mut data = serde_json::Map::new();
    data.insert("nome".to_string(), serde_json::json!("Maria Silva"));

    let text = replace_contract_tags(template, &data);
    assert!(text.contains("Maria Silva"));
    assert!(!text.contains("CPF"));

    let pdf = generate_contract_pdf(template, &data, None).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let path = uploads.store_contract_pdf(42, &pdf).await.unwrap();
    assert!(path.starts_with("/uploads/contracts/contract-42-"));
    assert_eq!(uploads.read(&path).await.unwrap(), pdf);
}

#[tokio::test]
async fn certificate_is_generated_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::default();
    settings.storage.uploads_dir = dir.path().to_string_lossy().to_string();
    settings.server.base_url = "https://admissio.example".to_string();

    let uploads = UploadService::new(settings.clone());
    let certificates = CertificateService::new(settings);

    let code = generate_certificate_code();
    let public_url = certificates.build_public_url(&code);
    assert!(public_url.contains(&code));

    let pdf = certificates
        .generate_pdf(&CertificateData {
            student_name: "Maria Silva".to_string(),
            course_name: "Engenharia de Software".to_string(),
            issued_at: Utc::now(),
            certificate_code: code.clone(),
            public_url,
            background_image: None,
            title: None,
            subtitle: None,
            signature_line: Some("Coordenação Acadêmica".to_string()),
        })
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let path = uploads.store_certificate_pdf(&code, &pdf).await.unwrap();
    assert_eq!(path, format!("/uploads/certificates/certificate-{}.pdf", code));
    assert_eq!(uploads.read(&path).await.unwrap(), pdf);
}
