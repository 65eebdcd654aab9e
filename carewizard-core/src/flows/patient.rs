use serde_json::Value;

use crate::error::Result;
use crate::field::{FieldSpec, FieldValue, FieldValues};
use crate::flows::{date_at, list_at, text_at, Seed, WizardMode};
use crate::payload::{PayloadContext, Section};
use crate::step::{DisplayMeta, StepCatalog, StepDescriptor};
use crate::validation::{rule, Check, RuleSet, ValidationRule};

pub const GENDERS: &[&str] = &["male", "female", "other", "prefer-not-to-say"];
pub const BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
pub const REGISTRATION_SOURCES: &[&str] = &["website", "walk-in", "referral", "phone", "social-media"];

/// Country sent with an address whose country was left blank.
pub const DEFAULT_COUNTRY: &str = "India";

const PERSONAL: &[FieldSpec] = &[
    FieldSpec::text("firstName"),
    FieldSpec::text("lastName"),
    FieldSpec::text("dateOfBirth"),
    FieldSpec::text("gender"),
    FieldSpec::text("bloodGroup"),
];

const CONTACT: &[FieldSpec] = &[
    FieldSpec::text("email"),
    FieldSpec::text("phone"),
    FieldSpec::text("alternatePhone"),
    FieldSpec::text("street"),
    FieldSpec::text("city"),
    FieldSpec::text("state"),
    FieldSpec::text("zipCode"),
    FieldSpec::text("country"),
];

const MEDICAL: &[FieldSpec] = &[
    FieldSpec::list("allergies"),
    FieldSpec::list("chronicConditions"),
    FieldSpec::list("currentMedications"),
    FieldSpec::text("emergencyContactName"),
    FieldSpec::text("emergencyContactPhone"),
    FieldSpec::text("emergencyContactRelationship"),
];

const SECURITY: &[FieldSpec] = &[
    FieldSpec::text("password"),
    FieldSpec::text("confirmPassword"),
    FieldSpec::text("registrationSource"),
];

pub fn catalog() -> Result<StepCatalog> {
    StepCatalog::new(vec![
        StepDescriptor::new(
            "personal",
            PERSONAL,
            DisplayMeta {
                title: "Personal Information",
                subtitle: "Basic details about the patient",
                icon: "user",
            },
        ),
        StepDescriptor::new(
            "contact",
            CONTACT,
            DisplayMeta {
                title: "Contact Details",
                subtitle: "How we can reach the patient",
                icon: "phone",
            },
        ),
        StepDescriptor::new(
            "medical",
            MEDICAL,
            DisplayMeta {
                title: "Medical History",
                subtitle: "Allergies, conditions and emergency contact",
                icon: "heart",
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
        rule("firstName", Check::MaxLength(50), "First name cannot exceed 50 characters"),
        rule("lastName", Check::Required, "Last name is required"),
        rule("lastName", Check::MaxLength(50), "Last name cannot exceed 50 characters"),
        rule("dateOfBirth", Check::Required, "Date of birth is required"),
        rule("dateOfBirth", Check::PastDate, "Date of birth must be a valid date in the past"),
        rule("gender", Check::Required, "Gender is required"),
        rule("gender", Check::OneOf(GENDERS), "Select a valid gender"),
        rule("bloodGroup", Check::OneOf(BLOOD_GROUPS), "Select a valid blood group"),
        rule("email", Check::Required, "Email is required"),
        rule("email", Check::Email, "Enter a valid email address"),
        rule("phone", Check::Required, "Phone number is required"),
        rule("phone", Check::Phone, "Enter a valid 10-digit phone number"),
        rule("alternatePhone", Check::Phone, "Enter a valid 10-digit phone number"),
        rule("street", Check::MaxLength(200), "Street address cannot exceed 200 characters"),
        rule("city", Check::MaxLength(100), "City cannot exceed 100 characters"),
        rule("state", Check::MaxLength(100), "State cannot exceed 100 characters"),
        rule("zipCode", Check::Digits { min: 5, max: 6 }, "ZIP code must be 5 or 6 digits"),
        rule("emergencyContactName", Check::MaxLength(100), "Name cannot exceed 100 characters"),
        rule(
            "emergencyContactPhone",
            Check::RequiredWith("emergencyContactName"),
            "Emergency contact phone is required",
        ),
        rule("emergencyContactPhone", Check::Phone, "Enter a valid 10-digit phone number"),
        rule(
            "emergencyContactRelationship",
            Check::RequiredWith("emergencyContactName"),
            "Relationship is required",
        ),
        rule("registrationSource", Check::Required, "Registration source is required"),
        rule(
            "registrationSource",
            Check::OneOf(REGISTRATION_SOURCES),
            "Select a valid registration source",
        ),
    ]
}

/// New patients must choose a password.
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
    RuleSet::new("patient-create", rules)
}

/// Editing keeps the current password unless a new one is typed.
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
    RuleSet::new("patient-edit", rules)
}

pub fn to_payload(values: &FieldValues, context: &PayloadContext<'_>) -> Value {
    let address = Section::new()
        .text("street", values.text("street"))
        .text("city", values.text("city"))
        .text("state", values.text("state"))
        .text("zipCode", values.text("zipCode"));
    let address = if address.is_empty() {
        address
    } else {
        let country = values.text("country").trim();
        address.text(
            "country",
            if country.is_empty() { DEFAULT_COUNTRY } else { country },
        )
    };

    let authentication = match context.mode {
        WizardMode::Create => Section::new().required_secret("password", values.text("password")),
        WizardMode::Edit => Section::new().secret("password", values.text("password")),
    };

    Section::new()
        .section(
            "personalInfo",
            Section::new()
                .text("firstName", values.text("firstName"))
                .text("lastName", values.text("lastName"))
                .text("dateOfBirth", values.text("dateOfBirth"))
                .text("gender", values.text("gender"))
                .text("bloodGroup", values.text("bloodGroup")),
        )
        .section(
            "contactInfo",
            Section::new()
                .email("email", values.text("email"))
                .text("phone", values.text("phone"))
                .text("alternatePhone", values.text("alternatePhone"))
                .section("address", address),
        )
        .section(
            "medicalInfo",
            Section::new()
                .list("allergies", values.list("allergies"))
                .list("chronicConditions", values.list("chronicConditions"))
                .list("currentMedications", values.list("currentMedications")),
        )
        .section(
            "emergencyContact",
            Section::new()
                .text("name", values.text("emergencyContactName"))
                .text("phone", values.text("emergencyContactPhone"))
                .text("relationship", values.text("emergencyContactRelationship")),
        )
        .section("authentication", authentication)
        .text("registrationSource", values.text("registrationSource"))
        .into_value()
}

pub fn seed(entity: &Value) -> Result<Seed> {
    let text = |key: &'static str, pointer: &str| (key, FieldValue::Text(text_at(entity, pointer)));
    let list = |key: &'static str, pointer: &str| (key, FieldValue::List(list_at(entity, pointer)));

    Ok(vec![
        text("firstName", "/personalInfo/firstName"),
        text("lastName", "/personalInfo/lastName"),
        ("dateOfBirth", FieldValue::Text(date_at(entity, "/personalInfo/dateOfBirth"))),
        text("gender", "/personalInfo/gender"),
        text("bloodGroup", "/personalInfo/bloodGroup"),
        text("email", "/contactInfo/email"),
        text("phone", "/contactInfo/phone"),
        text("alternatePhone", "/contactInfo/alternatePhone"),
        text("street", "/contactInfo/address/street"),
        text("city", "/contactInfo/address/city"),
        text("state", "/contactInfo/address/state"),
        text("zipCode", "/contactInfo/address/zipCode"),
        text("country", "/contactInfo/address/country"),
        list("allergies", "/medicalInfo/allergies"),
        list("chronicConditions", "/medicalInfo/chronicConditions"),
        list("currentMedications", "/medicalInfo/currentMedications"),
        text("emergencyContactName", "/emergencyContact/name"),
        text("emergencyContactPhone", "/emergencyContact/phone"),
        text("emergencyContactRelationship", "/emergencyContact/relationship"),
        text("registrationSource", "/registrationSource"),
    ])
}
