//! Submission gate and the interfaces of the remote clinic API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use crate::error::Result;
use crate::fee::DoctorSummary;
use crate::flows::{FlowKind, WizardMode};
use crate::navigation::Transition;
use crate::wizard::Wizard;

/// A create/update call built from a validated wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub kind: FlowKind,
    pub mode: WizardMode,
    /// Target of an update; `None` when creating.
    pub entity_id: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedEntity {
    pub id: Option<String>,
    pub body: Value,
}

impl CreatedEntity {
    /// Pick the server-assigned identifier out of a response body. Accepts
    /// `id`/`_id` at the top level or under a `data` envelope.
    pub fn from_response(body: Value) -> Self {
        let id = ["/id", "/_id", "/data/id", "/data/_id"]
            .iter()
            .find_map(|pointer| match body.pointer(pointer) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            });
        Self { id, body }
    }
}

/// Coarse classification of a failed call, used only to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureCategory {
    BadInput,
    Unauthorized,
    NotFound,
    Conflict,
    RateLimited,
    Server,
    Network,
}

impl FailureCategory {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => FailureCategory::Unauthorized,
            404 => FailureCategory::NotFound,
            409 => FailureCategory::Conflict,
            429 => FailureCategory::RateLimited,
            500..=599 => FailureCategory::Server,
            _ => FailureCategory::BadInput,
        }
    }

    pub fn generic_message(&self) -> &'static str {
        match self {
            FailureCategory::BadInput => "Some of the submitted information is invalid. Please review and try again.",
            FailureCategory::Unauthorized => "You are not authorized to perform this action. Please sign in again.",
            FailureCategory::NotFound => "The requested record could not be found.",
            FailureCategory::Conflict => "A record with these details already exists.",
            FailureCategory::RateLimited => "Too many requests. Please wait a moment and try again.",
            FailureCategory::Server => "Something went wrong on our side. Please try again later.",
            FailureCategory::Network => "Unable to reach the server. Check your connection and try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{}", self.user_message())]
pub struct ApiFailure {
    pub category: FailureCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Message supplied by the server, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiFailure {
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        Self {
            category: FailureCategory::from_status(status),
            status: Some(status),
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    pub fn network() -> Self {
        Self {
            category: FailureCategory::Network,
            status: None,
            message: None,
        }
    }

    /// Server text when present, otherwise the category's generic message.
    pub fn user_message(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.category.generic_message().to_string(),
        }
    }
}

/// The remote clinic API as seen by the wizard.
pub trait ClinicApi: Send + Sync {
    /// Perform the create/update call for a flow. Single attempt.
    fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> impl Future<Output = std::result::Result<CreatedEntity, ApiFailure>> + Send;

    /// Load a persisted entity to seed an edit wizard.
    fn fetch_entity(
        &self,
        kind: FlowKind,
        id: &str,
    ) -> impl Future<Output = std::result::Result<Value, ApiFailure>> + Send;

    /// Reference data for booking.
    fn list_doctors(
        &self,
    ) -> impl Future<Output = std::result::Result<Vec<DoctorSummary>, ApiFailure>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget side channel (toast, alert, log line).
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Notifier that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!(message = %notification.message, "Notification"),
            NotificationLevel::Error => tracing::warn!(message = %notification.message, "Notification"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Confirmed(CreatedEntity),
    Failed(ApiFailure),
}

/// Result of the "next" action: a step transition, or a submission when
/// the last step was already reached.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Transition(Transition),
    Submitted(SubmissionOutcome),
}

/// Performs the final create/update call exactly once per user submit.
pub struct SubmissionGate;

impl SubmissionGate {
    pub async fn submit<A, N>(
        wizard: &mut Wizard,
        api: &A,
        notifier: &N,
    ) -> Result<SubmissionOutcome>
    where
        A: ClinicApi,
        N: Notifier + ?Sized,
    {
        let request = wizard.begin_submission()?;
        let result = api.submit(&request).await;
        notifier.notify(wizard.finish_submission(&result));

        Ok(match result {
            Ok(created) => SubmissionOutcome::Confirmed(created),
            Err(failure) => SubmissionOutcome::Failed(failure),
        })
    }

    /// Advance the wizard; on the last step this submits instead.
    pub async fn advance<A, N>(wizard: &mut Wizard, api: &A, notifier: &N) -> Result<Progress>
    where
        A: ClinicApi,
        N: Notifier + ?Sized,
    {
        match wizard.advance()? {
            Transition::ReadyToSubmit => Self::submit(wizard, api, notifier)
                .await
                .map(Progress::Submitted),
            transition => Ok(Progress::Transition(transition)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// In-memory `ClinicApi` recording every request.
    #[derive(Default)]
    pub struct MockApi {
        pub requests: Mutex<Vec<SubmissionRequest>>,
        pub failure: Mutex<Option<ApiFailure>>,
        pub doctors: Vec<DoctorSummary>,
        pub entities: Vec<(String, Value)>,
    }

    impl MockApi {
        pub fn failing(failure: ApiFailure) -> Self {
            Self {
                failure: Mutex::new(Some(failure)),
                ..Default::default()
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl ClinicApi for MockApi {
        async fn submit(
            &self,
            request: &SubmissionRequest,
        ) -> std::result::Result<CreatedEntity, ApiFailure> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(failure) = self.failure.lock().unwrap().clone() {
                return Err(failure);
            }
            let id = format!("{}-{}", request.kind.entity(), self.request_count());
            Ok(CreatedEntity::from_response(serde_json::json!({ "_id": id })))
        }

        async fn fetch_entity(
            &self,
            kind: FlowKind,
            id: &str,
        ) -> std::result::Result<Value, ApiFailure> {
            self.entities
                .iter()
                .find(|(entity_id, _)| entity_id == id)
                .map(|(_, entity)| entity.clone())
                .ok_or_else(|| {
                    ApiFailure::from_status(404, Some(format!("{} not found", kind.entity())))
                })
        }

        async fn list_doctors(&self) -> std::result::Result<Vec<DoctorSummary>, ApiFailure> {
            Ok(self.doctors.clone())
        }
    }

    /// Notifier that keeps what it was told.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub seen: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }
}
