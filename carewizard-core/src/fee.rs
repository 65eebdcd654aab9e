//! Doctor reference data and the consultation fee shown during booking.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flows::{number_at, text_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Emergency,
}

impl AppointmentType {
    pub const CODES: &'static [&'static str] = &["consultation", "follow-up", "emergency"];

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "consultation" => Some(AppointmentType::Consultation),
            "follow-up" => Some(AppointmentType::FollowUp),
            "emergency" => Some(AppointmentType::Emergency),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "consultation",
            AppointmentType::FollowUp => "follow-up",
            AppointmentType::Emergency => "emergency",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub consultation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency: Option<f64>,
}

impl FeeSchedule {
    /// Follow-up and emergency fall back to the consultation fee when the
    /// doctor has not set them.
    pub fn fee_for(&self, appointment_type: AppointmentType) -> f64 {
        match appointment_type {
            AppointmentType::Consultation => self.consultation,
            AppointmentType::FollowUp => self.follow_up.unwrap_or(self.consultation),
            AppointmentType::Emergency => self.emergency.unwrap_or(self.consultation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub fees: FeeSchedule,
}

impl DoctorSummary {
    /// Read a doctor entity as returned by the clinic API. Accepts both the
    /// nested registration shape and a flat listing shape.
    pub fn from_entity(entity: &Value) -> Option<Self> {
        let id = [text_at(entity, "/_id"), text_at(entity, "/id")]
            .into_iter()
            .find(|id| !id.is_empty())?;

        let first = text_at(entity, "/personalInfo/firstName");
        let last = text_at(entity, "/personalInfo/lastName");
        let name = match (first.is_empty(), last.is_empty()) {
            (true, true) => text_at(entity, "/name"),
            _ => format!("{} {}", first, last).trim().to_string(),
        };

        let specialization = match text_at(entity, "/professionalInfo/specialization") {
            s if s.is_empty() => text_at(entity, "/specialization"),
            s => s,
        };

        let optional = |pointer: &str| Some(number_at(entity, pointer)).filter(|fee| *fee > 0.0);
        let fees = FeeSchedule {
            consultation: optional("/fees/consultation")
                .or_else(|| optional("/consultationFee"))
                .unwrap_or(0.0),
            follow_up: optional("/fees/followUp").or_else(|| optional("/followUpFee")),
            emergency: optional("/fees/emergency").or_else(|| optional("/emergencyFee")),
        };

        Some(Self {
            id,
            name,
            specialization,
            fees,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DoctorDirectory {
    doctors: Vec<DoctorSummary>,
}

impl DoctorDirectory {
    pub fn new(doctors: Vec<DoctorSummary>) -> Self {
        Self { doctors }
    }

    pub fn doctors(&self) -> &[DoctorSummary] {
        &self.doctors
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }

    pub fn get(&self, doctor_id: &str) -> Option<&DoctorSummary> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }

    /// `None` until both a known doctor and a known appointment type are
    /// selected.
    pub fn fee_for(&self, doctor_id: &str, appointment_type: &str) -> Option<f64> {
        let doctor = self.get(doctor_id.trim())?;
        let appointment_type = AppointmentType::parse(appointment_type)?;
        Some(doctor.fees.fee_for(appointment_type))
    }
}
