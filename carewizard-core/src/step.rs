use serde::Serialize;
use std::collections::HashSet;

use crate::error::{Result, WizardError};
use crate::field::FieldSpec;

/// Presentation-only metadata. Never consulted by navigation or validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayMeta {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub id: &'static str,
    pub fields: &'static [FieldSpec],
    pub display_meta: DisplayMeta,
}

impl StepDescriptor {
    pub const fn new(
        id: &'static str,
        fields: &'static [FieldSpec],
        display_meta: DisplayMeta,
    ) -> Self {
        Self {
            id,
            fields,
            display_meta,
        }
    }

    pub fn owns(&self, key: &str) -> bool {
        self.fields.iter().any(|spec| spec.key == key)
    }
}

/// Ordered, immutable list of steps.
///
/// Construction guarantees at least one step, unique step ids, and that every
/// field belongs to exactly one step.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct StepCatalog {
    steps: Vec<StepDescriptor>,
}

impl StepCatalog {
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self> {
        if steps.is_empty() {
            return Err(WizardError::Catalog("catalog has no steps".to_string()));
        }

        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for step in &steps {
            if !ids.insert(step.id) {
                return Err(WizardError::Catalog(format!("duplicate step id '{}'", step.id)));
            }
            for spec in step.fields {
                if !keys.insert(spec.key) {
                    return Err(WizardError::Catalog(format!(
                        "field '{}' is declared by more than one step",
                        spec.key
                    )));
                }
            }
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_at(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn index_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == step_id)
    }

    pub fn get(&self, step_id: &str) -> Option<&StepDescriptor> {
        self.steps.iter().find(|step| step.id == step_id)
    }

    /// Resolve a caller-supplied id to the catalog's own descriptor.
    pub fn resolve(&self, step_id: &str) -> Result<&StepDescriptor> {
        self.get(step_id)
            .ok_or_else(|| WizardError::UnknownStep(step_id.to_string()))
    }

    pub fn next_step_id(&self, step_id: &str) -> Option<&'static str> {
        let index = self.index_of(step_id)?;
        self.steps.get(index + 1).map(|step| step.id)
    }

    pub fn previous_step_id(&self, step_id: &str) -> Option<&'static str> {
        let index = self.index_of(step_id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .map(|step| step.id)
    }

    pub fn first(&self) -> &StepDescriptor {
        &self.steps[0]
    }

    pub fn last(&self) -> &StepDescriptor {
        &self.steps[self.steps.len() - 1]
    }

    /// The step that owns `key`.
    pub fn owner_of(&self, key: &str) -> Option<&'static str> {
        self.steps
            .iter()
            .find(|step| step.owns(key))
            .map(|step| step.id)
    }

    /// Every declared field, in step order.
    pub fn schema(&self) -> Vec<FieldSpec> {
        self.steps
            .iter()
            .flat_map(|step| step.fields.iter().copied())
            .collect()
    }
}
