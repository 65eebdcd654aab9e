//! Sparse JSON payload building.
//!
//! Text is trimmed and blank values, zero numbers and empty lists are left
//! out. A nested section with no members is left out as well.

use serde_json::{Map, Number, Value};

use crate::flows::WizardMode;

/// Inputs to a flow's payload transform besides the field record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadContext<'a> {
    pub mode: WizardMode,
    /// Identifier of an entity created by a previous wizard.
    pub precondition: Option<&'a str>,
    /// Fee resolved from reference data, if any.
    pub fee: Option<f64>,
}

impl<'a> PayloadContext<'a> {
    pub fn new(mode: WizardMode) -> Self {
        Self {
            mode,
            precondition: None,
            fee: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section(Map<String, Value>);

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, key: &str, value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return self;
        }
        self.value(key, Value::String(trimmed.to_string()))
    }

    /// Trimmed and lower-cased.
    pub fn email(self, key: &str, value: &str) -> Self {
        self.text(key, &value.trim().to_lowercase())
    }

    /// Trimmed and upper-cased.
    pub fn identifier(self, key: &str, value: &str) -> Self {
        self.text(key, &value.trim().to_uppercase())
    }

    /// Secrets are sent verbatim: whitespace may be part of a password.
    pub fn secret(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            return self;
        }
        self.value(key, Value::String(value.to_string()))
    }

    /// Always present, even when blank.
    pub fn required_secret(self, key: &str, value: &str) -> Self {
        self.value(key, Value::String(value.to_string()))
    }

    pub fn number(self, key: &str, value: f64) -> Self {
        if value == 0.0 || !value.is_finite() {
            return self;
        }
        let number = if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Number::from(value as i64)
        } else {
            match Number::from_f64(value) {
                Some(n) => n,
                None => return self,
            }
        };
        self.value(key, Value::Number(number))
    }

    pub fn list(self, key: &str, items: &[String]) -> Self {
        let items: Vec<Value> = items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect();
        if items.is_empty() {
            return self;
        }
        self.value(key, Value::Array(items))
    }

    pub fn section(self, key: &str, section: Section) -> Self {
        if section.is_empty() {
            return self;
        }
        self.value(key, section.into_value())
    }

    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values_omitted() {
        let payload = Section::new()
            .text("firstName", "  Asha ")
            .text("middleName", "   ")
            .number("experience", 0.0)
            .list("allergies", &[])
            .into_value();
        assert_eq!(payload, json!({"firstName": "Asha"}));
    }

    #[test]
    fn test_normalization() {
        let payload = Section::new()
            .email("email", " Asha@Example.COM ")
            .identifier("licenseNumber", " mh-12345 ")
            .into_value();
        assert_eq!(payload["email"], "asha@example.com");
        assert_eq!(payload["licenseNumber"], "MH-12345");
    }

    #[test]
    fn test_empty_section_omitted() {
        let payload = Section::new()
            .section("medicalInfo", Section::new().list("allergies", &["  ".to_string()]))
            .section("personalInfo", Section::new().text("firstName", "Asha"))
            .into_value();
        assert!(payload.get("medicalInfo").is_none());
        assert_eq!(payload["personalInfo"]["firstName"], "Asha");
    }

    #[test]
    fn test_numbers() {
        let payload = Section::new()
            .number("consultation", 800.0)
            .number("rating", 4.5)
            .into_value();
        assert_eq!(payload, json!({"consultation": 800, "rating": 4.5}));
    }

    #[test]
    fn test_secrets_are_verbatim() {
        let payload = Section::new()
            .secret("password", " pass phrase ")
            .secret("skipped", "")
            .required_secret("always", "")
            .into_value();
        assert_eq!(payload, json!({"password": " pass phrase ", "always": ""}));
    }
}
