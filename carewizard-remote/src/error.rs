use carewizard_core::{ApiFailure, FailureCategory, FlowKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Updating a {0} requires an entity id")]
    MissingEntityId(FlowKind),

    #[error("{0} has no remote read or update route")]
    Unsupported(FlowKind),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Routing problems surface to the wizard as bad input.
impl From<RemoteError> for ApiFailure {
    fn from(error: RemoteError) -> Self {
        ApiFailure {
            category: FailureCategory::BadInput,
            status: None,
            message: Some(error.to_string()),
        }
    }
}
