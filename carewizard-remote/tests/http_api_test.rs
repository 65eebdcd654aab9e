//! Drives `HttpClinicApi` against an in-process fake clinic backend.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use carewizard_core::{
    ClinicApi, FailureCategory, FlowKind, SubmissionRequest, WizardMode,
};
use carewizard_remote::HttpClinicApi;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Seen {
    authorization: Vec<String>,
    bodies: Vec<Value>,
}

type Shared = Arc<Mutex<Seen>>;

fn record(seen: &Shared, headers: &HeaderMap, body: Value) {
    let mut seen = seen.lock().unwrap();
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        seen.authorization.push(auth.to_string());
    }
    seen.bodies.push(body);
}

async fn create_patient(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record(&seen, &headers, body.clone());
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "data": {"_id": "p-100", "personalInfo": body["personalInfo"]}})),
    )
}

async fn update_patient(
    State(seen): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&seen, &headers, body);
    Json(json!({"_id": id}))
}

async fn read_patient(Path(id): Path<String>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if id == "p-100" {
        Ok(Json(json!({"data": {"_id": "p-100", "personalInfo": {"firstName": "Asha"}}})))
    } else {
        Err((StatusCode::NOT_FOUND, Json(json!({"error": "Patient not found"}))))
    }
}

async fn book() -> (StatusCode, Json<Value>) {
    (StatusCode::CONFLICT, Json(json!({"message": "Slot already booked"})))
}

async fn change_password() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn doctors() -> Json<Value> {
    Json(json!({"data": [
        {"_id": "d-1", "personalInfo": {"firstName": "Meera", "lastName": "Iyer"},
         "professionalInfo": {"specialization": "Cardiology"},
         "fees": {"consultation": 800, "followUp": 500}},
        {"name": "missing id"}
    ]}))
}

async fn start_backend() -> (String, Shared) {
    let seen = Shared::default();
    let app = Router::new()
        .route("/api/patients", post(create_patient))
        .route("/api/patients/{id}", get(read_patient).put(update_patient))
        .route("/api/appointments", post(book))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/doctors", get(doctors))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), seen)
}

fn request(kind: FlowKind, mode: WizardMode, entity_id: Option<&str>, payload: Value) -> SubmissionRequest {
    SubmissionRequest {
        kind,
        mode,
        entity_id: entity_id.map(str::to_string),
        payload,
    }
}

#[tokio::test]
async fn test_create_sends_payload_and_token() {
    let (base_url, seen) = start_backend().await;
    let api = HttpClinicApi::new(&base_url, Some("secret-token".into())).unwrap();

    let payload = json!({"personalInfo": {"firstName": "Asha"}});
    let created = api
        .submit(&request(FlowKind::PatientRegistration, WizardMode::Create, None, payload.clone()))
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("p-100"));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.bodies[0], payload);
    assert_eq!(seen.authorization[0], "Bearer secret-token");
}

#[tokio::test]
async fn test_update_uses_put_on_member() {
    let (base_url, seen) = start_backend().await;
    let api = HttpClinicApi::new(&base_url, None).unwrap();

    let created = api
        .submit(&request(
            FlowKind::PatientRegistration,
            WizardMode::Edit,
            Some("p-100"),
            json!({"bio": "x"}),
        ))
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("p-100"));
    assert!(seen.lock().unwrap().authorization.is_empty());
}

#[tokio::test]
async fn test_failures_carry_server_message_or_generic_text() {
    let (base_url, _seen) = start_backend().await;
    let api = HttpClinicApi::new(&base_url, None).unwrap();

    let conflict = api
        .submit(&request(FlowKind::AppointmentBooking, WizardMode::Create, None, json!({})))
        .await
        .unwrap_err();
    assert_eq!(conflict.category, FailureCategory::Conflict);
    assert_eq!(conflict.status, Some(409));
    assert_eq!(conflict.user_message(), "Slot already booked");

    let server = api
        .submit(&request(FlowKind::PasswordChange, WizardMode::Create, None, json!({})))
        .await
        .unwrap_err();
    assert_eq!(server.category, FailureCategory::Server);
    assert_eq!(server.user_message(), FailureCategory::Server.generic_message());
}

#[tokio::test]
async fn test_fetch_entity_unwraps_envelope() {
    let (base_url, _seen) = start_backend().await;
    let api = HttpClinicApi::new(&base_url, None).unwrap();

    let entity = api.fetch_entity(FlowKind::PatientRegistration, "p-100").await.unwrap();
    assert_eq!(entity["personalInfo"]["firstName"], "Asha");

    let missing = api
        .fetch_entity(FlowKind::PatientRegistration, "p-404")
        .await
        .unwrap_err();
    assert_eq!(missing.category, FailureCategory::NotFound);
    assert_eq!(missing.user_message(), "Patient not found");
}

#[tokio::test]
async fn test_list_doctors_skips_rows_without_id() {
    let (base_url, _seen) = start_backend().await;
    let api = HttpClinicApi::new(&base_url, None).unwrap();

    let doctors = api.list_doctors().await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].name, "Meera Iyer");
    assert_eq!(doctors[0].fees.follow_up, Some(500.0));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpClinicApi::new(&format!("http://{}", addr), None).unwrap();
    let failure = api.list_doctors().await.unwrap_err();
    assert_eq!(failure.category, FailureCategory::Network);
}
