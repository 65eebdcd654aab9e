//! Step-scoped validation.
//!
//! A flow owns two named rule sets (create and edit); the wizard mode picks
//! one. `StepValidator` evaluates only the rules of fields owned by the
//! requested step and never mutates the record.

pub mod checks;
pub mod rules;

pub use rules::{rule, Check, RuleSet, ValidationRule};

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::field::FieldValues;
use crate::step::StepCatalog;

/// Sparse field key -> message map.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

pub struct StepValidator<'a> {
    catalog: &'a StepCatalog,
    rules: &'a RuleSet,
    today: NaiveDate,
}

impl<'a> StepValidator<'a> {
    /// `today` is the reference date for date rules, fixed per wizard so that
    /// validation stays a pure function of the field record.
    pub fn new(catalog: &'a StepCatalog, rules: &'a RuleSet, today: NaiveDate) -> Self {
        Self {
            catalog,
            rules,
            today,
        }
    }

    pub fn validate_step(&self, step_id: &str, values: &FieldValues) -> Result<StepValidation> {
        let step = self.catalog.resolve(step_id)?;
        let mut errors = FieldErrors::new();

        for spec in step.fields {
            let Some(value) = values.get(spec.key) else {
                continue;
            };
            // First failing rule wins for each field.
            if let Some(failed) = self
                .rules
                .for_field(spec.key)
                .find(|r| !r.check.passes(value, values, self.today))
            {
                errors.insert(spec.key, failed.message.to_string());
            }
        }

        Ok(StepValidation {
            is_valid: errors.is_empty(),
            errors,
        })
    }

    /// The first step, in catalog order, that fails validation.
    pub fn first_invalid(&self, values: &FieldValues) -> Result<Option<(&'static str, StepValidation)>> {
        for step in self.catalog.steps() {
            let validation = self.validate_step(step.id, values)?;
            if !validation.is_valid {
                return Ok(Some((step.id, validation)));
            }
        }
        Ok(None)
    }
}
