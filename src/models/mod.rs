//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod course;
pub mod unit;
pub mod process;
pub mod step;
pub mod registration;
pub mod certificate;

// Re-export commonly used models
pub use course::{Course, CreateCourseRequest, UpdateCourseRequest};
pub use unit::{Unit, CreateUnitRequest, UpdateUnitRequest};
pub use process::{AdmissionProcess, CreateProcessRequest, UpdateProcessRequest};
pub use step::{
    AdmissionStep, StepType, CreateStepRequest, UpdateStepRequest,
    StepField, CreateFieldRequest, UpdateFieldRequest,
    StepDocument, CreateStepDocumentRequest, UpdateStepDocumentRequest,
    StepEvaluation, CreateEvaluationRequest, UpdateEvaluationRequest,
    EvaluationModule, CreateModuleRequest,
    EvaluationQuestion, CreateQuestionRequest,
};
pub use registration::{
    Registration, RegistrationStatus, CreateRegistrationRequest, UpdateRegistrationRequest,
    RegistrationData, SaveStepDataRequest,
    RegistrationDocument, RegistrationDocumentDetail, DocumentStatus, ReviewDocumentRequest,
    RegistrationEvaluation, SubmitEvaluationRequest,
};
pub use certificate::{
    Certificate, GenerateCertificateRequest, CertificateValidation,
    CertificateConfig, UpsertCertificateConfigRequest,
};
