//! State management module
//!
//! Holds the admission flow state machine.

pub mod wizard;

pub use wizard::{AdmissionWizard, WizardStep, FieldRules};
