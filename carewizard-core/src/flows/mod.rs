//! The concrete wizard flows: catalogs, rule sets, payload transforms and
//! edit-mode seeding.

pub mod appointment;
pub mod doctor;
pub mod password;
pub mod patient;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::Result;
use crate::field::{FieldValue, FieldValues};
use crate::payload::PayloadContext;
use crate::step::StepCatalog;
use crate::validation::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    PatientRegistration,
    DoctorRegistration,
    AppointmentBooking,
    PasswordChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardMode {
    #[default]
    Create,
    Edit,
}

/// Field values mapped from a persisted entity.
pub type Seed = Vec<(&'static str, FieldValue)>;

impl FlowKind {
    pub const ALL: [FlowKind; 4] = [
        FlowKind::PatientRegistration,
        FlowKind::DoctorRegistration,
        FlowKind::AppointmentBooking,
        FlowKind::PasswordChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::PatientRegistration => "patient-registration",
            FlowKind::DoctorRegistration => "doctor-registration",
            FlowKind::AppointmentBooking => "appointment-booking",
            FlowKind::PasswordChange => "password-change",
        }
    }

    /// The remote entity this flow creates or updates.
    pub fn entity(&self) -> &'static str {
        match self {
            FlowKind::PatientRegistration => "patient",
            FlowKind::DoctorRegistration => "doctor",
            FlowKind::AppointmentBooking => "appointment",
            FlowKind::PasswordChange => "account",
        }
    }

    pub fn supports_edit(&self) -> bool {
        matches!(
            self,
            FlowKind::PatientRegistration | FlowKind::DoctorRegistration
        )
    }

    /// Name of the identifier another wizard must supply before this one
    /// can start.
    pub fn precondition(&self) -> Option<&'static str> {
        match self {
            FlowKind::AppointmentBooking => Some("patientId"),
            _ => None,
        }
    }

    pub fn catalog(&self) -> Result<StepCatalog> {
        match self {
            FlowKind::PatientRegistration => patient::catalog(),
            FlowKind::DoctorRegistration => doctor::catalog(),
            FlowKind::AppointmentBooking => appointment::catalog(),
            FlowKind::PasswordChange => password::catalog(),
        }
    }

    /// The rule set for `mode`. Flows without an edit mode use their create
    /// rules throughout.
    pub fn rules(&self, mode: WizardMode) -> RuleSet {
        match (self, mode) {
            (FlowKind::PatientRegistration, WizardMode::Create) => patient::create_rules(),
            (FlowKind::PatientRegistration, WizardMode::Edit) => patient::edit_rules(),
            (FlowKind::DoctorRegistration, WizardMode::Create) => doctor::create_rules(),
            (FlowKind::DoctorRegistration, WizardMode::Edit) => doctor::edit_rules(),
            (FlowKind::AppointmentBooking, _) => appointment::rules(),
            (FlowKind::PasswordChange, _) => password::rules(),
        }
    }

    pub fn to_payload(&self, values: &FieldValues, context: &PayloadContext<'_>) -> Value {
        match self {
            FlowKind::PatientRegistration => patient::to_payload(values, context),
            FlowKind::DoctorRegistration => doctor::to_payload(values, context),
            FlowKind::AppointmentBooking => appointment::to_payload(values, context),
            FlowKind::PasswordChange => password::to_payload(values, context),
        }
    }

    /// Map a persisted entity back onto flat field values.
    pub fn seed(&self, entity: &Value) -> Result<Seed> {
        match self {
            FlowKind::PatientRegistration => patient::seed(entity),
            FlowKind::DoctorRegistration => doctor::seed(entity),
            FlowKind::AppointmentBooking | FlowKind::PasswordChange => {
                Err(crate::error::WizardError::EditUnsupported(*self))
            }
        }
    }

    pub fn success_message(&self, mode: WizardMode) -> &'static str {
        match (self, mode) {
            (FlowKind::PatientRegistration, WizardMode::Create) => "Patient registered successfully",
            (FlowKind::PatientRegistration, WizardMode::Edit) => "Patient updated successfully",
            (FlowKind::DoctorRegistration, WizardMode::Create) => "Doctor registered successfully",
            (FlowKind::DoctorRegistration, WizardMode::Edit) => "Doctor updated successfully",
            (FlowKind::AppointmentBooking, _) => "Appointment booked successfully",
            (FlowKind::PasswordChange, _) => "Password changed successfully",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text at a JSON pointer, empty when absent.
pub(crate) fn text_at(entity: &Value, pointer: &str) -> String {
    match entity.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Date at a JSON pointer, reduced to `YYYY-MM-DD` when stored as a timestamp.
pub(crate) fn date_at(entity: &Value, pointer: &str) -> String {
    let raw = text_at(entity, pointer);
    match raw.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => raw,
    }
}

pub(crate) fn number_at(entity: &Value, pointer: &str) -> f64 {
    match entity.pointer(pointer) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub(crate) fn list_at(entity: &Value, pointer: &str) -> Vec<String> {
    entity
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
