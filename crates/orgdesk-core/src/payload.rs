//! Raw request input and its conversion into typed form fields.
//!
//! Bodies arrive as JSON, urlencoded or multipart, so every value may be a
//! string. [`FormReader`] coerces values the way HTML forms expect (`"1"` is
//! true, `"42"` is an integer) and records a message for each value of the
//! wrong type. Constraints on the typed values are declared on the forms.

use crate::{FieldErrors, OrgdeskError, OrgdeskResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Image extensions recognised as images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];

/// Returns the words used for a field in messages: `u_join_date` reads
/// `u join date`.
#[must_use]
pub fn attribute_name(field: &str) -> String {
    field.replace('_', " ")
}

/// A file received in a multipart request.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Returns the lowercase extension of the client file name.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        let by_extension = self
            .extension()
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        by_extension || by_type
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One raw payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Json(Value),
    File(UploadedFile),
}

/// Incoming request fields, normalized: strings are trimmed (except
/// passwords) and empty strings become null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: HashMap<String, FieldValue>,
}

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from a JSON body. Anything but an object yields an
    /// empty payload.
    #[must_use]
    pub fn from_json(body: Value) -> Self {
        let mut payload = Self::new();
        if let Value::Object(map) = body {
            for (name, value) in map {
                payload.insert_json(name, value);
            }
        }
        payload
    }

    /// Inserts a JSON value.
    pub fn insert_json(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let value = normalize(&name, value);
        self.fields.insert(name, FieldValue::Json(value));
    }

    /// Inserts a form text value. `name[]` and `name[n]` append to the array
    /// stored under `name`.
    pub fn insert_text(&mut self, name: &str, value: String) {
        let Some((base, _)) = name.split_once('[') else {
            self.insert_json(name, Value::String(value));
            return;
        };

        let item = normalize(base, Value::String(value));
        match self.fields.get_mut(base) {
            Some(FieldValue::Json(Value::Array(items))) => items.push(item),
            _ => {
                self.fields
                    .insert(base.to_string(), FieldValue::Json(Value::Array(vec![item])));
            }
        }
    }

    /// Inserts an uploaded file.
    pub fn insert_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.fields.insert(name.into(), FieldValue::File(file));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }
}

fn normalize(name: &str, value: Value) -> Value {
    match value {
        Value::String(s) => {
            let s = if name.contains("password") {
                s
            } else {
                s.trim().to_string()
            };
            if s.is_empty() {
                Value::Null
            } else {
                Value::String(s)
            }
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| normalize(name, item)).collect())
        }
        other => other,
    }
}

/// Presence of a form field in the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Not sent: keep the current value.
    Missing,
    /// Sent as null or empty: clear the value.
    Null,
    Value(T),
}

impl<T> Field<T> {
    #[must_use]
    pub const fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Null => None,
        }
    }

    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Null => None,
        }
    }

    /// Takes the value of a field the form declares required.
    pub fn require(self, name: &str) -> OrgdeskResult<T> {
        self.into_option()
            .ok_or_else(|| OrgdeskError::internal(format!("validated field `{name}` is missing")))
    }

    /// Applies this field to a nullable current value.
    #[must_use]
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Missing => current,
            Self::Null => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Applies this field to a non-nullable current value; null keeps it.
    #[must_use]
    pub fn or_keep(self, current: T) -> T {
        match self {
            Self::Value(v) => v,
            Self::Missing | Self::Null => current,
        }
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    #[must_use]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Self::Missing => Field::Missing,
            Self::Null => Field::Null,
            Self::Value(v) => Field::Value(f(v)),
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Missing | Self::Null => serializer.serialize_none(),
        }
    }
}

/// Reads typed fields out of a [`Payload`].
///
/// A value of the wrong type reads as [`Field::Missing`] and leaves one
/// message under its field name; [`FormReader::finish`] returns them.
#[derive(Debug)]
pub struct FormReader {
    payload: Payload,
    errors: FieldErrors,
}

impl FormReader {
    #[must_use]
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            errors: FieldErrors::new(),
        }
    }

    fn reject(&mut self, key: impl Into<String>, message: String) {
        self.errors.entry(key.into()).or_default().push(message);
    }

    fn read<T>(&mut self, name: &str, problem: &str, parse: impl FnOnce(&Value) -> Option<T>) -> Field<T> {
        match self.payload.take(name) {
            None => Field::Missing,
            Some(FieldValue::Json(Value::Null)) => Field::Null,
            Some(FieldValue::Json(value)) => match parse(&value) {
                Some(v) => Field::Value(v),
                None => {
                    self.reject(name, format!("The {} {problem}", attribute_name(name)));
                    Field::Missing
                }
            },
            Some(FieldValue::File(_)) => {
                self.reject(name, format!("The {} {problem}", attribute_name(name)));
                Field::Missing
            }
        }
    }

    pub fn text(&mut self, name: &str) -> Field<String> {
        self.read(name, "must be a string.", |v| v.as_str().map(str::to_string))
    }

    /// Reads a string without reporting values of another type.
    pub fn text_or_none(&mut self, name: &str) -> Option<String> {
        match self.payload.take(name) {
            Some(FieldValue::Json(Value::String(s))) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&mut self, name: &str) -> Field<i64> {
        self.read(name, "must be an integer.", as_integer)
    }

    /// Reads a reference to another record. Non-numeric values can never
    /// match a row, so they are reported as an unknown selection.
    pub fn reference(&mut self, name: &str) -> Field<i64> {
        let id = match self.payload.take(name) {
            None => return Field::Missing,
            Some(FieldValue::Json(Value::Null)) => return Field::Null,
            Some(FieldValue::Json(value)) => as_integer(&value),
            Some(FieldValue::File(_)) => None,
        };
        match id {
            Some(id) => Field::Value(id),
            None => {
                self.reject(name, format!("The selected {} is invalid.", attribute_name(name)));
                Field::Missing
            }
        }
    }

    pub fn boolean(&mut self, name: &str) -> Field<bool> {
        self.read(name, "field must be true or false.", as_bool)
    }

    pub fn date(&mut self, name: &str) -> Field<NaiveDate> {
        self.read(name, "must be a valid date.", |v| v.as_str().and_then(parse_date))
    }

    /// Reads an array of record ids. Items that are not ids are reported
    /// under `name.<index>`.
    pub fn references(&mut self, name: &str) -> Field<Vec<i64>> {
        let items = match self.payload.take(name) {
            None => return Field::Missing,
            Some(FieldValue::Json(Value::Null)) => return Field::Null,
            Some(FieldValue::Json(Value::Array(items))) if items.is_empty() => return Field::Null,
            Some(FieldValue::Json(Value::Array(items))) => items,
            Some(_) => {
                self.reject(name, format!("The {} must be an array.", attribute_name(name)));
                return Field::Missing;
            }
        };

        let mut ids = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match as_integer(item) {
                Some(id) => ids.push(id),
                None => {
                    let key = format!("{name}.{index}");
                    let message = format!("The selected {key} is invalid.");
                    self.reject(key, message);
                    return Field::Missing;
                }
            }
        }
        Field::Value(ids)
    }

    /// Reads an image upload of one of the `allowed` extensions, at most
    /// `max_kilobytes` large.
    pub fn image(&mut self, name: &str, allowed: &[&str], max_kilobytes: u64) -> Field<UploadedFile> {
        let attribute = attribute_name(name);
        let file = match self.payload.take(name) {
            None => return Field::Missing,
            Some(FieldValue::Json(Value::Null)) => return Field::Null,
            Some(FieldValue::File(file)) if file.is_image() => file,
            Some(_) => {
                self.reject(name, format!("The {attribute} must be an image."));
                return Field::Missing;
            }
        };

        if !file.extension().is_some_and(|ext| allowed.contains(&ext.as_str())) {
            self.reject(
                name,
                format!("The {attribute} must be a file of type: {}.", allowed.join(", ")),
            );
            return Field::Missing;
        }
        if file.data.len() as u64 > max_kilobytes * 1024 {
            self.reject(
                name,
                format!("The {attribute} must not be greater than {max_kilobytes} kilobytes."),
            );
            return Field::Missing;
        }
        Field::Value(file)
    }

    /// Returns the type errors found while reading.
    #[must_use]
    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" => Some(true),
            "0" | "false" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
