//! Field schema and the flat field store shared by every step of a wizard.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, WizardError};
use crate::validation::FieldErrors;

/// Value shape a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Flag,
    List,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Flag => "flag",
            FieldKind::List => "list",
        }
    }

    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Text => FieldValue::Text(String::new()),
            FieldKind::Number => FieldValue::Number(0.0),
            FieldKind::Flag => FieldValue::Flag(false),
            FieldKind::List => FieldValue::List(Vec::new()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared field: its key and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(key: &'static str) -> Self {
        Self { key, kind: FieldKind::Text }
    }

    pub const fn number(key: &'static str) -> Self {
        Self { key, kind: FieldKind::Number }
    }

    pub const fn flag(key: &'static str) -> Self {
        Self { key, kind: FieldKind::Flag }
    }

    pub const fn list(key: &'static str) -> Self {
        Self { key, kind: FieldKind::List }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            FieldValue::Number(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }

    pub fn as_list(&self) -> &[String] {
        match self {
            FieldValue::List(items) => items,
            _ => &[],
        }
    }

    /// Blank text, zero, false and the empty list all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => *n == 0.0,
            FieldValue::Flag(b) => !b,
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Convert an incoming value to the declared kind.
    ///
    /// Text is accepted for numbers and flags since form inputs deliver strings.
    fn coerce(self, spec: &FieldSpec) -> Result<FieldValue> {
        let mismatch = || WizardError::FieldType {
            key: spec.key.to_string(),
            expected: spec.kind,
        };

        match (spec.kind, self) {
            (FieldKind::Text, FieldValue::Text(s)) => Ok(FieldValue::Text(s)),
            (FieldKind::Text, FieldValue::Number(n)) => Ok(FieldValue::Text(n.to_string())),
            (FieldKind::Number, FieldValue::Number(n)) if n.is_finite() => Ok(FieldValue::Number(n)),
            (FieldKind::Number, FieldValue::Text(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(FieldValue::Number(0.0));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(FieldValue::Number)
                    .ok_or_else(mismatch)
            }
            (FieldKind::Flag, FieldValue::Flag(b)) => Ok(FieldValue::Flag(b)),
            (FieldKind::Flag, FieldValue::Text(s)) => match s.trim() {
                "true" | "on" | "yes" => Ok(FieldValue::Flag(true)),
                "false" | "off" | "no" | "" => Ok(FieldValue::Flag(false)),
                _ => Err(mismatch()),
            },
            (FieldKind::List, FieldValue::List(items)) => Ok(FieldValue::List(items)),
            _ => Err(mismatch()),
        }
    }
}

/// The full flat record, one slot per declared field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<&'static str, FieldValue>);

impl FieldValues {
    /// Every field at its kind's default.
    pub fn from_schema(schema: &[FieldSpec]) -> Self {
        Self(
            schema
                .iter()
                .map(|spec| (spec.key, spec.kind.default_value()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Text value of `key`, empty when absent or not text.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).map(FieldValue::as_text).unwrap_or("")
    }

    pub fn number(&self, key: &str) -> f64 {
        self.get(key).map(FieldValue::as_number).unwrap_or(0.0)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::as_flag)
    }

    pub fn list(&self, key: &str) -> &[String] {
        self.get(key).map(FieldValue::as_list).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// Holds the field record and the sparse error map.
///
/// Writes never validate. Writing a field clears that field's error and no
/// other.
#[derive(Debug, Clone)]
pub struct FieldStore {
    schema: Vec<FieldSpec>,
    values: FieldValues,
    errors: FieldErrors,
}

impl FieldStore {
    pub fn new(schema: Vec<FieldSpec>) -> Self {
        let values = FieldValues::from_schema(&schema);
        Self {
            schema,
            values,
            errors: FieldErrors::new(),
        }
    }

    pub fn spec(&self, key: &str) -> Result<&FieldSpec> {
        self.schema
            .iter()
            .find(|spec| spec.key == key)
            .ok_or_else(|| WizardError::UnknownField(key.to_string()))
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Owned copy of the record.
    pub fn snapshot(&self) -> FieldValues {
        self.values.clone()
    }

    /// Replace the value at `key`. Returns whether the stored value changed.
    pub fn set_field(&mut self, key: &str, value: FieldValue) -> Result<bool> {
        let spec = *self.spec(key)?;
        let value = value.coerce(&spec)?;

        self.errors.remove(spec.key);
        let changed = self.values.0.get(spec.key) != Some(&value);
        self.values.0.insert(spec.key, value);
        Ok(changed)
    }

    pub fn set_field_list(&mut self, key: &str, items: Vec<String>) -> Result<bool> {
        self.set_field(key, FieldValue::List(items))
    }

    /// Append a trimmed tag unless it is blank or already present.
    pub fn add_list_item(&mut self, key: &str, item: &str) -> Result<bool> {
        let current = self.list_of(key)?;
        let item = item.trim();
        if item.is_empty()
            || current
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(item))
        {
            return Ok(false);
        }

        let mut next = current.to_vec();
        next.push(item.to_string());
        self.set_field_list(key, next)
    }

    /// Remove the tag at `index`; out-of-range indexes leave the list alone.
    pub fn remove_list_item(&mut self, key: &str, index: usize) -> Result<bool> {
        let current = self.list_of(key)?;
        if index >= current.len() {
            return Ok(false);
        }

        let mut next = current.to_vec();
        next.remove(index);
        self.set_field_list(key, next)
    }

    fn list_of(&self, key: &str) -> Result<&[String]> {
        let spec = self.spec(key)?;
        if spec.kind != FieldKind::List {
            return Err(WizardError::FieldType {
                key: key.to_string(),
                expected: spec.kind,
            });
        }
        Ok(self.values.list(spec.key))
    }

    /// Replace the errors of `fields` with `errors`.
    pub(crate) fn record_errors(&mut self, fields: &[FieldSpec], errors: &FieldErrors) {
        for spec in fields {
            self.errors.remove(spec.key);
        }
        for (key, message) in errors {
            self.errors.insert(key, message.clone());
        }
    }
}
