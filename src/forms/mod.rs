//! Input validation for everything users can write.
//!
//! Each form deserialises from the JSON body of an API request and turns
//! into a clean value with parsed enums and dates, or into [`FieldErrors`]
//! keyed by field name. Cross-field problems go under [`NON_FIELD`].

pub mod application;
pub mod artifact;
pub mod auth;
pub mod bulk;
pub mod decision;
pub mod integration;
pub mod project;
pub mod task;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Key used for errors that are not tied to a single field.
pub const NON_FIELD: &str = "__all__";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{field}: {}", msgs.join("; ")))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Trimmed required text with a maximum length in characters.
pub(crate) fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> String {
    let value = value.unwrap_or("").trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
        return String::new();
    }
    check_length(errors, field, value, max_len);
    value.to_string()
}

/// Trimmed optional text; empty when absent.
pub(crate) fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> String {
    let value = value.unwrap_or("").trim();
    check_length(errors, field, value, max_len);
    value.to_string()
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max_len: Option<usize>) {
    if let Some(max) = max_len {
        let len = value.chars().count();
        if len > max {
            errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }
}

/// Parse an enum field, falling back to `default` when the field is absent
/// or blank.
pub(crate) fn choice<T: Copy>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    default: T,
    parse: fn(&str) -> Option<T>,
    expected: fn() -> String,
) -> T {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => default,
        Some(v) => parse(v).unwrap_or_else(|| {
            errors.add(
                field,
                format!("Select a valid choice. '{v}' is not one of: {}.", expected()),
            );
            default
        }),
    }
}

/// Parse an enum field that must be present.
pub(crate) fn required_choice<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    expected: fn() -> String,
) -> Option<T> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            errors.add(field, "This field is required.");
            None
        }
        Some(v) => {
            let parsed = parse(v);
            if parsed.is_none() {
                errors.add(
                    field,
                    format!("Select a valid choice. '{v}' is not one of: {}.", expected()),
                );
            }
            parsed
        }
    }
}

/// Optional `YYYY-MM-DD` date. Blank counts as absent.
pub(crate) fn optional_date(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Enter a valid date (YYYY-MM-DD).");
            None
        }
    }
}

pub(crate) fn required_date(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    if value.map(str::trim).is_none_or(str::is_empty) {
        errors.add(field, "This field is required.");
        return None;
    }
    optional_date(errors, field, value)
}

/// Non-negative whole number.
pub(crate) fn non_negative(errors: &mut FieldErrors, field: &str, value: Option<i64>) -> Option<i32> {
    let value = value?;
    if value < 0 {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        return None;
    }
    match i32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, "Value is too large.");
            None
        }
    }
}

/// A list of strings given either as a JSON array or as newline-separated
/// text. Blank entries are dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    List(Vec<String>),
    Text(String),
}

impl TextList {
    pub fn into_items(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            TextList::List(items) => items,
            TextList::Text(text) => text.lines().map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
