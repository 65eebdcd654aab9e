use serde::{Deserialize, Serialize};

use crate::error::WizardError;
use crate::submission::{ApiFailure, FailureCategory};
use crate::validation::FieldErrors;

/// Error document returned to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub issue: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: IssueSeverity,
    pub code: IssueCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    /// Field keys or step ids the issue points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    Invalid,
    Required,
    Value,
    NotFound,
    NotSupported,
    Conflict,
    Login,
    Throttled,
    Transient,
    Exception,
    BusinessRule,
    Informational,
}

impl IssueReport {
    pub fn new(severity: IssueSeverity, code: IssueCode, diagnostics: impl Into<String>) -> Self {
        Self {
            issue: vec![Issue {
                severity,
                code,
                diagnostics: Some(diagnostics.into()),
                expression: None,
            }],
        }
    }

    pub fn error(code: IssueCode, diagnostics: impl Into<String>) -> Self {
        Self::new(IssueSeverity::Error, code, diagnostics)
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::error(IssueCode::NotFound, format!("{} not found: {}", entity, id))
    }

    /// One issue per failing field, pointing at the field key.
    pub fn from_field_errors(errors: &FieldErrors) -> Self {
        Self {
            issue: errors
                .iter()
                .map(|(key, message)| Issue {
                    severity: IssueSeverity::Error,
                    code: IssueCode::Value,
                    diagnostics: Some(message.clone()),
                    expression: Some(vec![key.to_string()]),
                })
                .collect(),
        }
    }

    pub fn from_failure(failure: &ApiFailure) -> Self {
        let code = match failure.category {
            FailureCategory::BadInput => IssueCode::Invalid,
            FailureCategory::Unauthorized => IssueCode::Login,
            FailureCategory::NotFound => IssueCode::NotFound,
            FailureCategory::Conflict => IssueCode::Conflict,
            FailureCategory::RateLimited => IssueCode::Throttled,
            FailureCategory::Server => IssueCode::Exception,
            FailureCategory::Network => IssueCode::Transient,
        };
        Self::error(code, failure.user_message())
    }

    pub fn from_wizard_error(error: &WizardError) -> Self {
        let code = match error {
            WizardError::UnknownStep(_) | WizardError::UnknownField(_) => IssueCode::NotFound,
            WizardError::FieldType { .. } | WizardError::InvalidJson(_) => IssueCode::Invalid,
            WizardError::StepInvalid { .. } => IssueCode::Value,
            WizardError::MissingPrecondition(_) => IssueCode::Required,
            WizardError::EditUnsupported(_) => IssueCode::NotSupported,
            WizardError::EntityNotFound { .. } => IssueCode::NotFound,
            WizardError::SubmissionInFlight | WizardError::AlreadyConfirmed => IssueCode::Conflict,
            WizardError::JumpRejected { .. } | WizardError::NotReadyToSubmit => {
                IssueCode::BusinessRule
            }
            WizardError::Catalog(_) | WizardError::RuleSet { .. } | WizardError::InvalidEntity(_) => {
                IssueCode::Exception
            }
        };
        Self::error(code, error.to_string())
    }

    pub fn with_expression(mut self, expression: Vec<String>) -> Self {
        if let Some(issue) = self.issue.last_mut() {
            issue.expression = Some(expression);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization() {
        let report = IssueReport::not_found("patient", "p-1");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("not-found"));
        assert!(json.contains("patient not found: p-1"));
        assert!(!json.contains("expression"));
    }

    #[test]
    fn test_field_errors_point_at_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("confirmPassword", "Passwords do not match".to_string());
        let report = IssueReport::from_field_errors(&errors);
        assert_eq!(report.issue.len(), 1);
        assert_eq!(report.issue[0].expression.as_ref().unwrap()[0], "confirmPassword");
        assert_eq!(report.issue[0].code, IssueCode::Value);
    }

    #[test]
    fn test_failure_codes() {
        let failure = ApiFailure::from_status(429, None);
        let report = IssueReport::from_failure(&failure);
        assert_eq!(report.issue[0].code, IssueCode::Throttled);
    }

    #[test]
    fn test_with_expression() {
        let report = IssueReport::from_wizard_error(&WizardError::JumpRejected {
            from: "personal".into(),
            to: "security".into(),
        })
        .with_expression(vec!["security".to_string()]);
        assert_eq!(report.issue[0].code, IssueCode::BusinessRule);
        assert_eq!(report.issue[0].expression.as_ref().unwrap()[0], "security");
    }
}
