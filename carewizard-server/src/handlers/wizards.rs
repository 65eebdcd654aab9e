//! Wizard session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use carewizard_core::{
    ClinicApi, DoctorDirectory, FailureCategory, FieldValue, FlowKind, IssueReport, Notifier,
    Transition, Wizard, WizardError, WizardMode,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::{failure_error, issue_response, session_not_found, wizard_error, ApiError};
use crate::sessions::SharedSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWizard {
    pub flow: FlowKind,
    #[serde(default)]
    pub mode: WizardMode,
    /// Entity to edit; required in edit mode.
    pub entity_id: Option<String>,
    /// Precondition of the booking flow.
    pub patient_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub value: FieldValue,
}

#[derive(Debug, Deserialize)]
pub struct ListItem {
    pub item: String,
}

fn session_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| session_not_found(id))
}

async fn session(state: &AppState, id: &str) -> Result<SharedSession, ApiError> {
    let uuid = session_id(id)?;
    state
        .sessions
        .get(&uuid)
        .await
        .ok_or_else(|| session_not_found(id))
}

fn view_response(id: &str, wizard: &Wizard) -> Response {
    Json(json!({ "id": id, "wizard": wizard.view() })).into_response()
}

fn transition_response(id: &str, transition: &Transition, wizard: &Wizard) -> Response {
    Json(json!({
        "id": id,
        "transition": transition,
        "wizard": wizard.view(),
    }))
    .into_response()
}

fn rejected(wizard: &Wizard) -> ApiError {
    issue_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        IssueReport::from_field_errors(wizard.errors()),
    )
}

/// Reference data for the fee display. Booking still works without it.
async fn load_directory(state: &AppState) -> Option<DoctorDirectory> {
    match state.api.list_doctors().await {
        Ok(doctors) => Some(DoctorDirectory::new(doctors)),
        Err(failure) => {
            tracing::warn!(category = ?failure.category, "Failed to load doctor directory");
            None
        }
    }
}

/// Start a wizard session (POST /wizards)
pub async fn create_wizard(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateWizard>,
) -> Result<Response, ApiError> {
    let kind = body.flow;
    let wizard = match body.mode {
        WizardMode::Create => match (kind.precondition(), body.patient_id) {
            (Some(_), Some(patient_id)) => Wizard::with_precondition(kind, patient_id),
            _ => Wizard::create(kind),
        }
        .map_err(|e| wizard_error(&e))?,
        WizardMode::Edit => {
            if !kind.supports_edit() {
                return Err(wizard_error(&WizardError::EditUnsupported(kind)));
            }
            let entity_id = body
                .entity_id
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| wizard_error(&WizardError::MissingPrecondition("entityId")))?;

            let entity = state
                .api
                .fetch_entity(kind, &entity_id)
                .await
                .map_err(|failure| match failure.category {
                    FailureCategory::NotFound => wizard_error(&WizardError::EntityNotFound {
                        entity: kind.entity().to_string(),
                        id: entity_id.clone(),
                    }),
                    _ => failure_error(&failure),
                })?;
            Wizard::edit(kind, entity_id, &entity).map_err(|e| wizard_error(&e))?
        }
    };
    let mut wizard = wizard.with_policy(state.config.wizard.completion_policy);

    if kind == FlowKind::AppointmentBooking
        && let Some(directory) = load_directory(&state).await
    {
        wizard.attach_directory(directory);
    }

    let view = json!(wizard.view());
    let id = state.sessions.insert(wizard).await;
    tracing::info!(session = %id, flow = %kind, mode = ?body.mode, "Wizard session started");

    Ok((StatusCode::CREATED, Json(json!({ "id": id, "wizard": view }))).into_response())
}

/// GET /wizards/{id}
pub async fn get_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let wizard = session.lock().await;
    Ok(view_response(&id, &wizard))
}

/// DELETE /wizards/{id}
pub async fn delete_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uuid = session_id(&id)?;
    if state.sessions.remove(&uuid).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}

/// PUT /wizards/{id}/fields/{key}
pub async fn set_field(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(String, String)>,
    Json(update): Json<FieldUpdate>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let mut wizard = session.lock().await;
    wizard
        .set_field(&key, update.value)
        .map_err(|e| wizard_error(&e))?;
    Ok(view_response(&id, &wizard))
}

/// POST /wizards/{id}/fields/{key}/items
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(String, String)>,
    Json(body): Json<ListItem>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let mut wizard = session.lock().await;
    wizard
        .add_list_item(&key, &body.item)
        .map_err(|e| wizard_error(&e))?;
    Ok(view_response(&id, &wizard))
}

/// DELETE /wizards/{id}/fields/{key}/items/{index}
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((id, key, index)): Path<(String, String, usize)>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let mut wizard = session.lock().await;
    wizard
        .remove_list_item(&key, index)
        .map_err(|e| wizard_error(&e))?;
    Ok(view_response(&id, &wizard))
}

/// POST /wizards/{id}/advance
///
/// On the last step this submits. The session lock is released while the
/// backend call runs; the in-flight phase refuses anything else meanwhile.
/// A confirmed session is discarded unless a booking can still follow it.
pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let uuid = session_id(&id)?;
    let session = session(&state, &id).await?;
    let mut wizard = session.lock().await;

    let transition = wizard.advance().map_err(|e| wizard_error(&e))?;
    match transition {
        Transition::ReadyToSubmit => {}
        Transition::Rejected { .. } => return Err(rejected(&wizard)),
        other => return Ok(transition_response(&id, &other, &wizard)),
    }

    let request = match wizard.begin_submission() {
        Ok(request) => request,
        Err(WizardError::StepInvalid { .. }) => return Err(rejected(&wizard)),
        Err(e) => return Err(wizard_error(&e)),
    };
    drop(wizard);

    let result = state.api.submit(&request).await;

    let mut wizard = session.lock().await;
    let notification = wizard.finish_submission(&result);
    state.notifier.notify(notification.clone());

    let created = result.map_err(|failure| failure_error(&failure))?;
    let body = json!({
        "id": id,
        "entityId": created.id,
        "notification": notification,
        "wizard": wizard.view(),
    });
    let keep = wizard.offers_booking();
    drop(wizard);

    if !keep {
        state.sessions.discard(&uuid).await;
        tracing::debug!(session = %id, "Wizard session discarded after submission");
    }
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// POST /wizards/{id}/retreat
pub async fn retreat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let mut wizard = session.lock().await;
    let transition = wizard.retreat().map_err(|e| wizard_error(&e))?;
    Ok(transition_response(&id, &transition, &wizard))
}

/// POST /wizards/{id}/jump/{step}
pub async fn jump(
    State(state): State<Arc<AppState>>,
    Path((id, step)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let session = session(&state, &id).await?;
    let mut wizard = session.lock().await;
    match wizard.jump(&step).map_err(|e| wizard_error(&e))? {
        Transition::Rejected { .. } => Err(rejected(&wizard)),
        transition => Ok(transition_response(&id, &transition, &wizard)),
    }
}

/// Start the booking wizard for a confirmed patient registration
/// (POST /wizards/{id}/booking). A registration has at most one booking
/// session; asking again returns it with 200.
pub async fn start_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let uuid = session_id(&id)?;
    let session = session(&state, &id).await?;
    // Held until the booking is linked so concurrent starts see one session.
    let registration = session.lock().await;

    if let Some((booking_id, booking)) = state.sessions.follow_up(&uuid).await {
        let booking = booking.lock().await;
        return Ok(view_response(&booking_id.to_string(), &booking));
    }

    let mut booking = registration.follow_up_booking().map_err(|e| match &e {
        WizardError::MissingPrecondition(_) => {
            issue_response(StatusCode::CONFLICT, IssueReport::from_wizard_error(&e))
        }
        _ => wizard_error(&e),
    })?;

    if let Some(directory) = load_directory(&state).await {
        booking.attach_directory(directory);
    }

    let view = json!(booking.view());
    let booking_id = state
        .sessions
        .insert_follow_up(&uuid, booking)
        .await
        .ok_or_else(|| session_not_found(&id))?;
    drop(registration);
    tracing::info!(session = %booking_id, registration = %id, "Booking session started");

    Ok((StatusCode::CREATED, Json(json!({ "id": booking_id, "wizard": view }))).into_response())
}
