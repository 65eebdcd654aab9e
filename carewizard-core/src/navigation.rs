//! Navigation controller: owns the current step and the completed set and
//! gates every transition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Result, WizardError};
use crate::field::FieldValues;
use crate::flows::WizardMode;
use crate::step::StepCatalog;
use crate::validation::{FieldErrors, StepValidator};

/// What happens to completion when a field of an already completed step is
/// edited in create mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionPolicy {
    /// Keep every step marked completed.
    Retain,
    /// Revoke the edited step and every later step.
    #[default]
    PruneOnEdit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Transition {
    Moved {
        from: &'static str,
        to: &'static str,
    },
    /// The last step validated; the caller hands over to the submission gate.
    ReadyToSubmit,
    Rejected {
        step: &'static str,
        errors: FieldErrors,
    },
    Stayed,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    current: &'static str,
    completed: BTreeSet<&'static str>,
}

impl Navigator {
    /// Fresh wizard on the first step, nothing completed.
    pub fn new(catalog: &StepCatalog) -> Self {
        Self {
            current: catalog.first().id,
            completed: BTreeSet::new(),
        }
    }

    /// Resumed wizard: every step pre-marked completed.
    pub fn resumed(catalog: &StepCatalog) -> Self {
        Self {
            current: catalog.first().id,
            completed: catalog.steps().iter().map(|step| step.id).collect(),
        }
    }

    pub fn current(&self) -> &'static str {
        self.current
    }

    pub fn completed(&self) -> &BTreeSet<&'static str> {
        &self.completed
    }

    pub fn is_completed(&self, step_id: &str) -> bool {
        self.completed.contains(step_id)
    }

    pub fn advance(
        &mut self,
        catalog: &StepCatalog,
        validator: &StepValidator<'_>,
        values: &FieldValues,
    ) -> Result<Transition> {
        let from = self.current;
        let validation = validator.validate_step(from, values)?;
        if !validation.is_valid {
            tracing::debug!(step = from, errors = validation.errors.len(), "Advance rejected");
            return Ok(Transition::Rejected {
                step: from,
                errors: validation.errors,
            });
        }

        self.completed.insert(from);
        match catalog.next_step_id(from) {
            Some(to) => {
                self.current = to;
                tracing::debug!(from, to, "Advanced");
                Ok(Transition::Moved { from, to })
            }
            None => Ok(Transition::ReadyToSubmit),
        }
    }

    /// Always allowed; keeps completion as it is.
    pub fn retreat(&mut self, catalog: &StepCatalog) -> Transition {
        let from = self.current;
        match catalog.previous_step_id(from) {
            Some(to) => {
                self.current = to;
                tracing::debug!(from, to, "Retreated");
                Transition::Moved { from, to }
            }
            None => Transition::Stayed,
        }
    }

    pub fn jump(
        &mut self,
        catalog: &StepCatalog,
        validator: &StepValidator<'_>,
        values: &FieldValues,
        mode: WizardMode,
        target: &str,
    ) -> Result<Transition> {
        let target = catalog.resolve(target)?.id;
        let from = self.current;
        if target == from {
            return Ok(Transition::Stayed);
        }

        if mode == WizardMode::Edit || self.completed.contains(target) {
            self.current = target;
            tracing::debug!(from, to = target, "Jumped");
            return Ok(Transition::Moved { from, to: target });
        }

        if catalog.next_step_id(from) == Some(target) {
            return self.advance(catalog, validator, values);
        }

        Err(WizardError::JumpRejected {
            from: from.to_string(),
            to: target.to_string(),
        })
    }

    /// Revoke completion of `step_id` and every step after it.
    pub fn prune_from(&mut self, catalog: &StepCatalog, step_id: &str) {
        let Some(start) = catalog.index_of(step_id) else {
            return;
        };
        for step in &catalog.steps()[start..] {
            self.completed.remove(step.id);
        }
    }

    pub(crate) fn mark_completed(&mut self, step_id: &'static str) {
        self.completed.insert(step_id);
    }

    pub(crate) fn move_to(&mut self, step_id: &'static str) {
        self.current = step_id;
    }
}
