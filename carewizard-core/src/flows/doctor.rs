use serde_json::Value;

use crate::error::Result;
use crate::field::{FieldSpec, FieldValue, FieldValues};
use crate::flows::patient::GENDERS;
use crate::flows::{list_at, number_at, text_at, Seed, WizardMode};
use crate::payload::{PayloadContext, Section};
use crate::step::{DisplayMeta, StepCatalog, StepDescriptor};
use crate::validation::{rule, Check, RuleSet, ValidationRule};

pub const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const MAX_FEE: f64 = 100_000.0;

const PERSONAL: &[FieldSpec] = &[
    FieldSpec::text("firstName"),
    FieldSpec::text("lastName"),
    FieldSpec::text("email"),
    FieldSpec::text("phone"),
    FieldSpec::text("gender"),
];

const PROFESSIONAL: &[FieldSpec] = &[
    FieldSpec::text("specialization"),
    FieldSpec::list("qualifications"),
    FieldSpec::number("experienceYears"),
    FieldSpec::text("licenseNumber"),
    FieldSpec::text("department"),
];

const PRACTICE: &[FieldSpec] = &[
    FieldSpec::number("consultationFee"),
    FieldSpec::number("followUpFee"),
    FieldSpec::number("emergencyFee"),
    FieldSpec::list("availableDays"),
    FieldSpec::number("slotDuration"),
    FieldSpec::text("bio"),
];

const SECURITY: &[FieldSpec] = &[
    FieldSpec::text("password"),
    FieldSpec::text("confirmPassword"),
];

pub fn catalog() -> Result<StepCatalog> {
    StepCatalog::new(vec![
        StepDescriptor::new(
            "personal",
            PERSONAL,
            DisplayMeta {
                title: "Personal Details",
                subtitle: "Name and contact information",
                icon: "user",
            },
        ),
        StepDescriptor::new(
            "professional",
            PROFESSIONAL,
            DisplayMeta {
                title: "Professional Details",
                subtitle: "Specialization, qualifications and license",
                icon: "stethoscope",
            },
        ),
        StepDescriptor::new(
            "practice",
            PRACTICE,
            DisplayMeta {
                title: "Practice & Fees",
                subtitle: "Consultation fees and availability",
                icon: "calendar",
            },
        ),
        StepDescriptor::new(
            "security",
            SECURITY,
            DisplayMeta {
                title: "Account Security",
                subtitle: "Set up portal access",
                icon: "lock",
            },
        ),
    ])
}

fn profile_rules() -> Vec<ValidationRule> {
    vec![
        rule("firstName", Check::Required, "First name is required"),
        rule("firstName", Check::MinLength(2), "First name must be at least 2 characters"),
        rule("lastName", Check::Required, "Last name is required"),
        rule("email", Check::Required, "Email is required"),
        rule("email", Check::Email, "Enter a valid email address"),
        rule("phone", Check::Required, "Phone number is required"),
        rule("phone", Check::Phone, "Enter a valid 10-digit phone number"),
        rule("gender", Check::OneOf(GENDERS), "Select a valid gender"),
        rule("specialization", Check::Required, "Specialization is required"),
        rule("specialization", Check::MaxLength(100), "Specialization cannot exceed 100 characters"),
        rule("qualifications", Check::NonEmptyList, "Add at least one qualification"),
        rule(
            "experienceYears",
            Check::Range { min: 0.0, max: 60.0 },
            "Experience must be between 0 and 60 years",
        ),
        rule("licenseNumber", Check::Required, "License number is required"),
        rule(
            "licenseNumber",
            Check::Identifier,
            "License number must be 5-20 letters, digits, '-' or '/'",
        ),
        rule("department", Check::MaxLength(100), "Department cannot exceed 100 characters"),
        rule("consultationFee", Check::Required, "Consultation fee is required"),
        rule(
            "consultationFee",
            Check::Range { min: 1.0, max: MAX_FEE },
            "Consultation fee must be between 1 and 100000",
        ),
        rule(
            "followUpFee",
            Check::Range { min: 1.0, max: MAX_FEE },
            "Follow-up fee must be between 1 and 100000",
        ),
        rule(
            "emergencyFee",
            Check::Range { min: 1.0, max: MAX_FEE },
            "Emergency fee must be between 1 and 100000",
        ),
        rule("availableDays", Check::NonEmptyList, "Select at least one available day"),
        rule("availableDays", Check::ListOneOf(WEEKDAYS), "Unknown weekday selected"),
        rule(
            "slotDuration",
            Check::Range { min: 10.0, max: 120.0 },
            "Slot duration must be between 10 and 120 minutes",
        ),
        rule("bio", Check::MaxLength(1000), "Bio cannot exceed 1000 characters"),
    ]
}

pub fn create_rules() -> RuleSet {
    let mut rules = profile_rules();
    rules.extend([
        rule("password", Check::Required, "Password is required"),
        rule(
            "password",
            Check::StrongPassword,
            "Password must be at least 8 characters with upper-case, lower-case, digit and symbol",
        ),
        rule("confirmPassword", Check::Required, "Please confirm the password"),
        rule("confirmPassword", Check::Matches("password"), "Passwords do not match"),
    ]);
    RuleSet::new("doctor-create", rules)
}

pub fn edit_rules() -> RuleSet {
    let mut rules = profile_rules();
    rules.extend([
        rule(
            "password",
            Check::StrongPassword,
            "Password must be at least 8 characters with upper-case, lower-case, digit and symbol",
        ),
        rule(
            "confirmPassword",
            Check::RequiredWith("password"),
            "Please confirm the new password",
        ),
        rule("confirmPassword", Check::Matches("password"), "Passwords do not match"),
    ]);
    RuleSet::new("doctor-edit", rules)
}

pub fn to_payload(values: &FieldValues, context: &PayloadContext<'_>) -> Value {
    let authentication = match context.mode {
        WizardMode::Create => Section::new().required_secret("password", values.text("password")),
        WizardMode::Edit => Section::new().secret("password", values.text("password")),
    };

    let days: Vec<String> = values
        .list("availableDays")
        .iter()
        .map(|day| day.trim().to_lowercase())
        .collect();

    Section::new()
        .section(
            "personalInfo",
            Section::new()
                .text("firstName", values.text("firstName"))
                .text("lastName", values.text("lastName"))
                .email("email", values.text("email"))
                .text("phone", values.text("phone"))
                .text("gender", values.text("gender")),
        )
        .section(
            "professionalInfo",
            Section::new()
                .text("specialization", values.text("specialization"))
                .list("qualifications", values.list("qualifications"))
                .number("experience", values.number("experienceYears"))
                .identifier("licenseNumber", values.text("licenseNumber"))
                .text("department", values.text("department")),
        )
        .section(
            "fees",
            Section::new()
                .number("consultation", values.number("consultationFee"))
                .number("followUp", values.number("followUpFee"))
                .number("emergency", values.number("emergencyFee")),
        )
        .section(
            "availability",
            Section::new()
                .list("days", &days)
                .number("slotDuration", values.number("slotDuration")),
        )
        .text("bio", values.text("bio"))
        .section("authentication", authentication)
        .into_value()
}

pub fn seed(entity: &Value) -> Result<Seed> {
    let text = |key: &'static str, pointer: &str| (key, FieldValue::Text(text_at(entity, pointer)));
    let number = |key: &'static str, pointer: &str| (key, FieldValue::Number(number_at(entity, pointer)));
    let list = |key: &'static str, pointer: &str| (key, FieldValue::List(list_at(entity, pointer)));

    Ok(vec![
        text("firstName", "/personalInfo/firstName"),
        text("lastName", "/personalInfo/lastName"),
        text("email", "/personalInfo/email"),
        text("phone", "/personalInfo/phone"),
        text("gender", "/personalInfo/gender"),
        text("specialization", "/professionalInfo/specialization"),
        list("qualifications", "/professionalInfo/qualifications"),
        number("experienceYears", "/professionalInfo/experience"),
        text("licenseNumber", "/professionalInfo/licenseNumber"),
        text("department", "/professionalInfo/department"),
        number("consultationFee", "/fees/consultation"),
        number("followUpFee", "/fees/followUp"),
        number("emergencyFee", "/fees/emergency"),
        list("availableDays", "/availability/days"),
        number("slotDuration", "/availability/slotDuration"),
        text("bio", "/bio"),
    ])
}
