//! Validation of typed request forms.
//!
//! Field constraints are declared with `validator` derive attributes on the
//! forms. [`Field`] implements the `validator` traits so that `Missing` and
//! `Null` are skipped by every check except `required`. Uniqueness and
//! existence need storage and go through [`RuleLookup`].

use crate::{Field, FieldErrors, OrgdeskError, OrgdeskResult};
use async_trait::async_trait;
use std::borrow::Cow;
use validator::{
    Validate, ValidateEmail, ValidateLength, ValidateRange, ValidateRequired, ValidationError,
    ValidationErrors,
};

/// Codes in the order their checks are reported. Only the first failing
/// check of a field yields a message.
const CHECK_ORDER: &[&str] = &["required", "email", "length", "range", "must_match"];

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Returns one message per failing field.
    fn field_errors(&self) -> FieldErrors {
        self.validate()
            .err()
            .map(|errors| validation_errors_to_field_errors(&errors))
            .unwrap_or_default()
    }

    /// Validates the struct and returns an `OrgdeskError` on failure.
    fn validate_request(&self) -> OrgdeskResult<()> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(OrgdeskError::Validation(errors))
        }
    }
}

impl<T: Validate> ValidateExt for T {}

/// Converts `validator::ValidationErrors` to field messages.
#[must_use]
pub fn validation_errors_to_field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            errors
                .iter()
                .min_by_key(|error| {
                    CHECK_ORDER
                        .iter()
                        .position(|code| *code == error.code.as_ref())
                        .unwrap_or(CHECK_ORDER.len())
                })
                .map(|error| (field.to_string(), vec![message_for(field, error)]))
        })
        .collect()
}

/// Adds messages for fields that have none yet.
pub fn merge_field_errors(errors: &mut FieldErrors, more: FieldErrors) {
    for (field, messages) in more {
        errors.entry(field).or_insert(messages);
    }
}

fn message_for(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    // A range reports one code for both bounds; name the one that failed.
    let param = |name: &str| error.params.get(name).and_then(serde_json::Value::as_i64);
    let attribute = crate::attribute_name(field);
    match (error.code.as_ref(), param("value"), param("min"), param("max")) {
        ("range", Some(value), Some(min), _) if value < min => {
            format!("The {attribute} must be at least {min}.")
        }
        ("range", _, _, Some(max)) => format!("The {attribute} must not be greater than {max}."),
        (code, ..) => code.to_string(),
    }
}

impl<T> ValidateRequired for Field<T> {
    fn is_some(&self) -> bool {
        self.as_value().is_some()
    }
}

impl<T: ValidateLength<u64>> ValidateLength<u64> for Field<T> {
    fn length(&self) -> Option<u64> {
        self.as_value().and_then(ValidateLength::length)
    }
}

impl<T: ValidateEmail> ValidateEmail for Field<T> {
    fn as_email_string(&self) -> Option<Cow<'_, str>> {
        self.as_value().and_then(ValidateEmail::as_email_string)
    }
}

impl<T: PartialOrd> ValidateRange<T> for Field<T> {
    fn greater_than(&self, max: T) -> Option<bool> {
        self.as_value().map(|value| *value > max)
    }

    fn less_than(&self, min: T) -> Option<bool> {
        self.as_value().map(|value| *value < min)
    }
}

/// Columns that must be unique within their table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueKey {
    UserEmployeeId,
    /// Compared case-insensitively.
    UserEmail,
    RoleName,
    DivisionCode,
    PositionCode,
}

/// Tables that reference fields may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExistsTarget {
    User,
    Role,
    Division,
    Position,
}

/// Storage lookups needed by uniqueness and existence checks.
#[async_trait]
pub trait RuleLookup: Send + Sync {
    /// Returns true if another row already holds `value`. The row with id
    /// `ignore` is not counted.
    async fn is_taken(&self, key: UniqueKey, value: &str, ignore: Option<i64>) -> OrgdeskResult<bool>;

    /// Returns true if a row with `id` exists.
    async fn exists(&self, target: ExistsTarget, id: i64) -> OrgdeskResult<bool>;
}

/// Lookup for forms without uniqueness or existence checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

#[async_trait]
impl RuleLookup for NoLookup {
    async fn is_taken(&self, key: UniqueKey, _value: &str, _ignore: Option<i64>) -> OrgdeskResult<bool> {
        Err(OrgdeskError::internal(format!("no lookup available for {key:?}")))
    }

    async fn exists(&self, target: ExistsTarget, _id: i64) -> OrgdeskResult<bool> {
        Err(OrgdeskError::internal(format!("no lookup available for {target:?}")))
    }
}
