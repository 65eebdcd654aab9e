use serde_json::Value;

use crate::error::Result;
use crate::field::{FieldSpec, FieldValues};
use crate::payload::{PayloadContext, Section};
use crate::step::{DisplayMeta, StepCatalog, StepDescriptor};
use crate::validation::{rule, Check, RuleSet};

const PASSWORD: &[FieldSpec] = &[
    FieldSpec::text("currentPassword"),
    FieldSpec::text("newPassword"),
    FieldSpec::text("confirmNewPassword"),
];

pub fn catalog() -> Result<StepCatalog> {
    StepCatalog::new(vec![StepDescriptor::new(
        "password",
        PASSWORD,
        DisplayMeta {
            title: "Change Password",
            subtitle: "Choose a new password for your account",
            icon: "key",
        },
    )])
}

pub fn rules() -> RuleSet {
    RuleSet::new(
        "password-change",
        vec![
            rule("currentPassword", Check::Required, "Current password is required"),
            rule("newPassword", Check::Required, "New password is required"),
            rule(
                "newPassword",
                Check::StrongPassword,
                "Password must be at least 8 characters with upper-case, lower-case, digit and symbol",
            ),
            rule(
                "newPassword",
                Check::DiffersFrom("currentPassword"),
                "New password must differ from the current password",
            ),
            rule("confirmNewPassword", Check::Required, "Please confirm the new password"),
            rule("confirmNewPassword", Check::Matches("newPassword"), "Passwords do not match"),
        ],
    )
}

pub fn to_payload(values: &FieldValues, _context: &PayloadContext<'_>) -> Value {
    Section::new()
        .required_secret("currentPassword", values.text("currentPassword"))
        .required_secret("newPassword", values.text("newPassword"))
        .into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldStore, FieldValue};
    use crate::validation::StepValidator;
    use chrono::NaiveDate;

    #[test]
    fn test_new_password_must_differ() {
        let catalog = catalog().unwrap();
        let rules = rules();
        let validator = StepValidator::new(&catalog, &rules, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        let mut store = FieldStore::new(catalog.schema());
        for key in ["currentPassword", "newPassword", "confirmNewPassword"] {
            store.set_field(key, FieldValue::text("Same#Pass1")).unwrap();
        }

        let result = validator.validate_step("password", store.values()).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors.contains_key("newPassword"));

        store.set_field("newPassword", FieldValue::text("Other#Pass2")).unwrap();
        store.set_field("confirmNewPassword", FieldValue::text("Other#Pass2")).unwrap();
        assert!(validator.validate_step("password", store.values()).unwrap().is_valid);
    }
}
