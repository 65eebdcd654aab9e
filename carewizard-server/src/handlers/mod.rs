pub mod dashboard;
pub mod flows;
pub mod wizards;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use carewizard_core::{ApiFailure, FailureCategory, IssueCode, IssueReport, WizardError};
use serde_json::{json, Value};

/// Error response: status plus an `IssueReport` body.
pub type ApiError = (StatusCode, Json<Value>);

pub fn issue_response(status: StatusCode, report: IssueReport) -> ApiError {
    (status, Json(json!(report)))
}

pub fn wizard_error(error: &WizardError) -> ApiError {
    let status = match error {
        WizardError::UnknownStep(_)
        | WizardError::UnknownField(_)
        | WizardError::EntityNotFound { .. } => StatusCode::NOT_FOUND,
        WizardError::FieldType { .. }
        | WizardError::InvalidJson(_)
        | WizardError::InvalidEntity(_)
        | WizardError::MissingPrecondition(_)
        | WizardError::EditUnsupported(_) => StatusCode::BAD_REQUEST,
        WizardError::StepInvalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WizardError::JumpRejected { .. }
        | WizardError::NotReadyToSubmit
        | WizardError::SubmissionInFlight
        | WizardError::AlreadyConfirmed => StatusCode::CONFLICT,
        WizardError::Catalog(_) | WizardError::RuleSet { .. } => {
            tracing::error!(error = %error, "Broken flow definition");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    issue_response(status, IssueReport::from_wizard_error(error))
}

/// Backend failures keep the backend's status; transport failures are 502.
pub fn failure_error(failure: &ApiFailure) -> ApiError {
    let status = match failure.category {
        FailureCategory::Network => StatusCode::BAD_GATEWAY,
        _ => failure
            .status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY),
    };
    issue_response(status, IssueReport::from_failure(failure))
}

pub fn session_not_found(id: &str) -> ApiError {
    issue_response(
        StatusCode::NOT_FOUND,
        IssueReport::error(IssueCode::NotFound, format!("Wizard session not found: {}", id)),
    )
}

/// Health check (GET /health)
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
