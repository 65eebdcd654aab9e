//! REST client for the clinic backend.

use carewizard_core::{
    ApiFailure, ClinicApi, CreatedEntity, DoctorSummary, FlowKind, SubmissionRequest, WizardMode,
};
use reqwest::{Client, Method};
use serde_json::Value;

use crate::error::{RemoteError, Result};

/// Method and path of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

fn collection(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::PatientRegistration => "/patients",
        FlowKind::DoctorRegistration => "/doctors",
        FlowKind::AppointmentBooking => "/appointments",
        FlowKind::PasswordChange => "/auth/change-password",
    }
}

/// Create is a POST to the collection, update a PUT to the member.
pub fn submit_route(request: &SubmissionRequest) -> Result<Route> {
    let kind = request.kind;
    match request.mode {
        WizardMode::Create => Ok(Route::new(Method::POST, collection(kind))),
        WizardMode::Edit => {
            if !kind.supports_edit() {
                return Err(RemoteError::Unsupported(kind));
            }
            let id = request
                .entity_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .ok_or(RemoteError::MissingEntityId(kind))?;
            Ok(Route::new(
                Method::PUT,
                format!("{}/{}", collection(kind), urlencoding::encode(id)),
            ))
        }
    }
}

pub fn entity_route(kind: FlowKind, id: &str) -> Result<Route> {
    if !kind.supports_edit() {
        return Err(RemoteError::Unsupported(kind));
    }
    Ok(Route::new(
        Method::GET,
        format!("{}/{}", collection(kind), urlencoding::encode(id)),
    ))
}

/// Best-effort human message from an error body.
pub fn failure_message(body: &Value) -> Option<String> {
    ["/message", "/error/message", "/error", "/detail"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .or_else(|| body.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Unwrap a `{ "data": ... }` envelope when present.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("data").is_some_and(|d| d.is_object() || d.is_array()) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub struct HttpClinicApi {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl HttpClinicApi {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, route: &Route, body: Option<&Value>) -> std::result::Result<Value, ApiFailure> {
        let url = format!("{}{}", self.base_url, route.path);
        let mut request = self.client.request(route.method.clone(), &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Clinic API unreachable");
            ApiFailure::network()
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Failed to read clinic API response");
            ApiFailure::network()
        })?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !status.is_success() {
            tracing::warn!(
                method = %route.method,
                url = %url,
                status = %status,
                "Clinic API call failed"
            );
            return Err(ApiFailure::from_status(status.as_u16(), failure_message(&body)));
        }

        tracing::debug!(method = %route.method, url = %url, status = %status, "Clinic API call");
        Ok(body)
    }
}

impl ClinicApi for HttpClinicApi {
    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> std::result::Result<CreatedEntity, ApiFailure> {
        let route = submit_route(request)?;
        let body = self.send(&route, Some(&request.payload)).await?;
        let created = CreatedEntity::from_response(body);
        tracing::info!(flow = %request.kind, entity_id = ?created.id, "Submission accepted");
        Ok(created)
    }

    async fn fetch_entity(&self, kind: FlowKind, id: &str) -> std::result::Result<Value, ApiFailure> {
        let route = entity_route(kind, id)?;
        let body = self.send(&route, None).await?;
        Ok(unwrap_data(body))
    }

    async fn list_doctors(&self) -> std::result::Result<Vec<DoctorSummary>, ApiFailure> {
        let route = Route::new(Method::GET, "/doctors");
        let body = unwrap_data(self.send(&route, None).await?);
        let rows = match &body {
            Value::Array(rows) => rows.as_slice(),
            Value::Object(map) => map
                .get("doctors")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        };
        Ok(rows.iter().filter_map(DoctorSummary::from_entity).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(kind: FlowKind, mode: WizardMode, entity_id: Option<&str>) -> SubmissionRequest {
        SubmissionRequest {
            kind,
            mode,
            entity_id: entity_id.map(str::to_string),
            payload: json!({}),
        }
    }

    #[test]
    fn test_submit_routes() {
        let route = submit_route(&request(FlowKind::PatientRegistration, WizardMode::Create, None)).unwrap();
        assert_eq!(route, Route::new(Method::POST, "/patients"));

        let route = submit_route(&request(FlowKind::DoctorRegistration, WizardMode::Edit, Some("d 1"))).unwrap();
        assert_eq!(route, Route::new(Method::PUT, "/doctors/d%201"));

        let route = submit_route(&request(FlowKind::PasswordChange, WizardMode::Create, None)).unwrap();
        assert_eq!(route.path, "/auth/change-password");

        assert!(matches!(
            submit_route(&request(FlowKind::PatientRegistration, WizardMode::Edit, None)),
            Err(RemoteError::MissingEntityId(_))
        ));
        assert!(matches!(
            entity_route(FlowKind::AppointmentBooking, "a-1"),
            Err(RemoteError::Unsupported(_))
        ));
    }

    #[test]
    fn test_failure_message_shapes() {
        assert_eq!(failure_message(&json!({"message": "Email taken"})).as_deref(), Some("Email taken"));
        assert_eq!(failure_message(&json!({"error": "Bad token"})).as_deref(), Some("Bad token"));
        assert_eq!(
            failure_message(&json!({"error": {"message": "Nested"}})).as_deref(),
            Some("Nested")
        );
        assert_eq!(failure_message(&json!("plain text")).as_deref(), Some("plain text"));
        assert_eq!(failure_message(&json!({"message": " "})), None);
        assert_eq!(failure_message(&Value::Null), None);
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpClinicApi::new("localhost:4000", None),
            Err(RemoteError::InvalidBaseUrl(_))
        ));
        let api = HttpClinicApi::new("http://localhost:4000/api/", Some(" ".into())).unwrap();
        assert_eq!(api.base_url(), "http://localhost:4000/api");
        assert!(api.token.is_none());
    }
}
