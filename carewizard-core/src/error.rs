use thiserror::Error;

use crate::field::FieldKind;
use crate::flows::FlowKind;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {key} expects a {expected} value")]
    FieldType { key: String, expected: FieldKind },

    #[error("Invalid step catalog: {0}")]
    Catalog(String),

    #[error("Invalid rule set {rule_set}: {message}")]
    RuleSet { rule_set: String, message: String },

    #[error("Cannot jump from {from} to {to}")]
    JumpRejected { from: String, to: String },

    #[error("Step {step} has {count} invalid field(s)")]
    StepInvalid { step: String, count: usize },

    #[error("Wizard is not on its final step")]
    NotReadyToSubmit,

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Wizard has already been submitted")]
    AlreadyConfirmed,

    #[error("Missing precondition: {0}")]
    MissingPrecondition(&'static str),

    #[error("{0} does not support edit mode")]
    EditUnsupported(FlowKind),

    #[error("Entity not found: {entity}/{id}")]
    EntityNotFound { entity: String, id: String },

    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WizardError>;
