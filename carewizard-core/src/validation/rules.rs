use chrono::NaiveDate;

use crate::error::{Result, WizardError};
use crate::field::{FieldValue, FieldValues};
use crate::step::StepCatalog;
use crate::validation::checks;

/// A predicate applied to one field.
///
/// Only `Required`, `NonEmptyList` and `RequiredWith` look at empty values;
/// every other check passes when the field is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Phone,
    Digits { min: usize, max: usize },
    Identifier,
    OneOf(&'static [&'static str]),
    /// `YYYY-MM-DD`, not after the reference date.
    PastDate,
    /// `YYYY-MM-DD`, on or after the reference date.
    FutureDate,
    Time,
    Range { min: f64, max: f64 },
    NonEmptyList,
    ListOneOf(&'static [&'static str]),
    StrongPassword,
    /// Must equal the named field.
    Matches(&'static str),
    /// Required whenever the named field is non-empty.
    RequiredWith(&'static str),
    /// Must differ from the named field.
    DiffersFrom(&'static str),
}

impl Check {
    /// The other field a cross-field check reads.
    pub fn referenced_field(&self) -> Option<&'static str> {
        match self {
            Check::Matches(other) | Check::RequiredWith(other) | Check::DiffersFrom(other) => {
                Some(other)
            }
            _ => None,
        }
    }

    fn applies_to_empty(&self) -> bool {
        matches!(
            self,
            Check::Required | Check::NonEmptyList | Check::RequiredWith(_)
        )
    }

    pub(crate) fn passes(&self, value: &FieldValue, values: &FieldValues, today: NaiveDate) -> bool {
        if value.is_empty() && !self.applies_to_empty() {
            return true;
        }

        let text = value.as_text().trim();
        match self {
            Check::Required => !value.is_empty(),
            Check::MinLength(min) => text.chars().count() >= *min,
            Check::MaxLength(max) => text.chars().count() <= *max,
            Check::Email => checks::is_email(text),
            Check::Phone => checks::is_phone(text),
            Check::Digits { min, max } => checks::is_digits(text, *min, *max),
            Check::Identifier => checks::is_identifier(text),
            Check::OneOf(options) => options.contains(&text),
            Check::PastDate => checks::parse_date(text).is_some_and(|date| date <= today),
            Check::FutureDate => checks::parse_date(text).is_some_and(|date| date >= today),
            Check::Time => checks::parse_time(text).is_some(),
            Check::Range { min, max } => {
                let n = value.as_number();
                n >= *min && n <= *max
            }
            Check::NonEmptyList => !value.as_list().is_empty(),
            Check::ListOneOf(options) => value
                .as_list()
                .iter()
                .all(|item| options.contains(&item.as_str())),
            Check::StrongPassword => checks::is_strong_password(value.as_text()),
            Check::Matches(other) => values.get(other) == Some(value),
            Check::RequiredWith(other) => {
                values.get(other).is_none_or(FieldValue::is_empty) || !value.is_empty()
            }
            Check::DiffersFrom(other) => values.get(other) != Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub field: &'static str,
    pub check: Check,
    pub message: &'static str,
}

pub fn rule(field: &'static str, check: Check, message: &'static str) -> ValidationRule {
    ValidationRule {
        field,
        check,
        message,
    }
}

/// A named collection of rules, e.g. `patient-create` or `patient-edit`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: &'static str,
    rules: Vec<ValidationRule>,
}

impl RuleSet {
    pub fn new(name: &'static str, rules: Vec<ValidationRule>) -> Self {
        Self { name, rules }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn for_field<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ValidationRule> + 'a {
        self.rules.iter().filter(move |r| r.field == key)
    }

    /// Verify every rule targets a declared field and that cross-field rules
    /// stay inside the owning step.
    pub fn check_against(&self, catalog: &StepCatalog) -> Result<()> {
        for r in &self.rules {
            let owner = catalog.owner_of(r.field).ok_or_else(|| WizardError::RuleSet {
                rule_set: self.name.to_string(),
                message: format!("rule targets undeclared field '{}'", r.field),
            })?;

            if let Some(other) = r.check.referenced_field()
                && catalog.owner_of(other) != Some(owner)
            {
                return Err(WizardError::RuleSet {
                    rule_set: self.name.to_string(),
                    message: format!(
                        "rule on '{}' references '{}' outside step '{}'",
                        r.field, other, owner
                    ),
                });
            }
        }
        Ok(())
    }
}
