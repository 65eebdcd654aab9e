use serde_json::Value;

use crate::error::Result;
use crate::fee::AppointmentType;
use crate::field::{FieldSpec, FieldValues};
use crate::payload::{PayloadContext, Section};
use crate::step::{DisplayMeta, StepCatalog, StepDescriptor};
use crate::validation::{rule, Check, RuleSet};

const DOCTOR: &[FieldSpec] = &[
    FieldSpec::text("doctorId"),
    FieldSpec::text("appointmentType"),
];

const SLOT: &[FieldSpec] = &[
    FieldSpec::text("appointmentDate"),
    FieldSpec::text("timeSlot"),
];

const DETAILS: &[FieldSpec] = &[
    FieldSpec::text("reason"),
    FieldSpec::list("symptoms"),
    FieldSpec::text("notes"),
];

pub fn catalog() -> Result<StepCatalog> {
    StepCatalog::new(vec![
        StepDescriptor::new(
            "doctor",
            DOCTOR,
            DisplayMeta {
                title: "Choose a Doctor",
                subtitle: "Doctor and type of visit",
                icon: "stethoscope",
            },
        ),
        StepDescriptor::new(
            "slot",
            SLOT,
            DisplayMeta {
                title: "Pick a Slot",
                subtitle: "Date and time of the appointment",
                icon: "clock",
            },
        ),
        StepDescriptor::new(
            "details",
            DETAILS,
            DisplayMeta {
                title: "Visit Details",
                subtitle: "Reason for the visit",
                icon: "clipboard",
            },
        ),
    ])
}

pub fn rules() -> RuleSet {
    RuleSet::new(
        "appointment",
        vec![
            rule("doctorId", Check::Required, "Please select a doctor"),
            rule("appointmentType", Check::Required, "Please select an appointment type"),
            rule(
                "appointmentType",
                Check::OneOf(AppointmentType::CODES),
                "Select a valid appointment type",
            ),
            rule("appointmentDate", Check::Required, "Please select a date"),
            rule(
                "appointmentDate",
                Check::FutureDate,
                "Appointment date cannot be in the past",
            ),
            rule("timeSlot", Check::Required, "Please select a time slot"),
            rule("timeSlot", Check::Time, "Time slot must be in HH:MM format"),
            rule("reason", Check::Required, "Reason for visit is required"),
            rule("reason", Check::MinLength(10), "Please describe the reason in at least 10 characters"),
            rule("reason", Check::MaxLength(500), "Reason cannot exceed 500 characters"),
            rule("notes", Check::MaxLength(1000), "Notes cannot exceed 1000 characters"),
        ],
    )
}

pub fn to_payload(values: &FieldValues, context: &PayloadContext<'_>) -> Value {
    let mut payload = Section::new();
    if let Some(patient_id) = context.precondition {
        payload = payload.text("patientId", patient_id);
    }

    payload
        .text("doctorId", values.text("doctorId"))
        .text("appointmentType", values.text("appointmentType"))
        .text("appointmentDate", values.text("appointmentDate"))
        .text("timeSlot", values.text("timeSlot"))
        .text("reason", values.text("reason"))
        .list("symptoms", values.list("symptoms"))
        .text("notes", values.text("notes"))
        .number("fee", context.fee.unwrap_or(0.0))
        .into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldStore, FieldValue};
    use crate::flows::WizardMode;
    use crate::validation::StepValidator;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn booking() -> FieldStore {
        let mut store = FieldStore::new(catalog().unwrap().schema());
        for (key, value) in [
            ("doctorId", "d-1"),
            ("appointmentType", "consultation"),
            ("appointmentDate", "2026-10-21"),
            ("timeSlot", "10:30"),
            ("reason", "Recurring chest pain after exercise"),
        ] {
            store.set_field(key, FieldValue::text(value)).unwrap();
        }
        store
    }

    #[test]
    fn test_booking_validates() {
        let catalog = catalog().unwrap();
        let rules = rules();
        let validator = StepValidator::new(&catalog, &rules, today());
        assert!(validator.first_invalid(booking().values()).unwrap().is_none());
    }

    #[test]
    fn test_past_date_and_bad_time_rejected() {
        let catalog = catalog().unwrap();
        let rules = rules();
        let validator = StepValidator::new(&catalog, &rules, today());
        let mut store = booking();
        store.set_field("appointmentDate", FieldValue::text("2026-10-01")).unwrap();
        store.set_field("timeSlot", FieldValue::text("10.30am")).unwrap();

        let result = validator.validate_step("slot", store.values()).unwrap();
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_payload_carries_patient_and_fee() {
        let context = PayloadContext {
            mode: WizardMode::Create,
            precondition: Some("p-42"),
            fee: Some(800.0),
        };
        let payload = to_payload(booking().values(), &context);
        assert_eq!(payload["patientId"], "p-42");
        assert_eq!(payload["fee"], 800);
        assert_eq!(payload["timeSlot"], "10:30");
        assert!(payload.get("symptoms").is_none());
        assert!(payload.get("notes").is_none());
    }
}
