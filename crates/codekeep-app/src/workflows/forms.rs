//! Form submissions and their validation
//!
//! Only two runtime checks remain: required fields must be present and
//! non-blank, and the expiry must be a positive whole number of days.

use std::collections::BTreeMap;

use crate::core::ActionId;
use crate::errors::AppError;

/// Field name carrying the number of days before a batch expires
pub const DAYS_TO_EXPIRY: &str = "days-to-expiry";

/// Values submitted with an action, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: BTreeMap<String, String>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Trimmed value of a field, `None` when missing or blank
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Check the fields `action` needs.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate(action: ActionId, form: &FormSubmission) -> Result<(), Vec<AppError>> {
    let mut errors: Vec<AppError> = action
        .required_fields()
        .iter()
        .filter(|field| form.value(field).is_none())
        .map(|field| AppError::validation(*field, "This field is required"))
        .collect();

    if action == ActionId::GenerateWithExpiry && errors.is_empty() {
        if let Err(err) = days_to_expiry(form) {
            errors.push(err);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse the expiry field as a positive whole number of days
pub fn days_to_expiry(form: &FormSubmission) -> Result<u32, AppError> {
    let raw = form
        .value(DAYS_TO_EXPIRY)
        .ok_or_else(|| AppError::validation(DAYS_TO_EXPIRY, "This field is required"))?;

    match raw.parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(AppError::validation(
            DAYS_TO_EXPIRY,
            "Days to expiry must be a positive whole number",
        )),
    }
}
