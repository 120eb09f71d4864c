//! Field-level validation of JSON request bodies.
//!
//! Request bodies are decoded into a [serde_json::Value] first and then read
//! field by field with a [FieldReader], so that every problem with the input is
//! reported at once rather than stopping at the first failure.

use std::fmt::Display;

use axum::{
    Json,
    extract::{Query, rejection::{JsonRejection, QueryRejection}},
};
use serde::Serialize;
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::date_format::parse_iso_date;

/// A problem with a single field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The JSON name of the offending field.
    pub field: String,
    /// A human readable description of the problem.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// A non-empty list of field errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// The field errors as a slice.
    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any error refers to `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(value: Vec<FieldError>) -> Self {
        Self(value)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();

        write!(f, "{}", fields.join(", "))
    }
}

/// Fields that the server assigns. Clients may send them back unchanged, so
/// they are dropped instead of reported.
const SERVER_ASSIGNED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// The field holding the owner of a record, which only the server may set.
pub const OWNER_FIELD: &str = "userId";

/// Reads typed fields out of a JSON object and collects the errors.
pub struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    /// Start reading `value`, which must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a validation error on the field `body` if `value` is not an object.
    pub fn new(value: &'a Value) -> Result<Self, ValidationErrors> {
        let object = value.as_object().ok_or_else(|| {
            ValidationErrors::from(vec![FieldError::new(
                "body",
                format!("Expected object, received {}", type_name(value)),
            )])
        })?;

        let mut errors = Vec::new();
        if object.contains_key(OWNER_FIELD) {
            errors.push(FieldError::new(
                OWNER_FIELD,
                "The owner of a record cannot be set by the client",
            ));
        }

        Ok(Self { object, errors })
    }

    /// Read a field that must be present and not null.
    pub fn required<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        match self.get(field) {
            None => {
                self.errors.push(FieldError::new(field, "Required"));
                None
            }
            Some(Value::Null) => {
                self.errors
                    .push(FieldError::new(field, "Expected a value, received null"));
                None
            }
            Some(value) => self.parse(field, value, parse),
        }
    }

    /// Read a field that may be absent or null.
    ///
    /// Absent and null are both read as `None`.
    pub fn optional<T>(
        &mut self,
        field: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        match self.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => self.parse(field, value, parse),
        }
    }

    /// Read a field for a partial update.
    ///
    /// Returns `None` if the field is absent, `Some(None)` if it is null and
    /// `nullable`, and `Some(Some(value))` otherwise.
    pub fn patch<T>(
        &mut self,
        field: &str,
        nullable: bool,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<Option<T>> {
        match self.get(field) {
            None => None,
            Some(Value::Null) if nullable => Some(None),
            Some(Value::Null) => {
                self.errors
                    .push(FieldError::new(field, "Expected a value, received null"));
                None
            }
            Some(value) => self.parse(field, value, parse).map(Some),
        }
    }

    /// Finish reading, returning `value` if no field failed validation.
    ///
    /// # Errors
    ///
    /// Returns every field error collected while reading.
    pub fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(ValidationErrors(self.errors));
        }

        // All required fields parsed if there are no errors, so this only
        // fails if a caller forgot to read a field.
        value().ok_or_else(|| ValidationErrors(vec![FieldError::new("body", "Incomplete input")]))
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        if SERVER_ASSIGNED_FIELDS.contains(&field) {
            return None;
        }

        self.object.get(field)
    }

    fn parse<T>(
        &mut self,
        field: &str,
        value: &Value,
        parse: impl Fn(&Value) -> Result<T, String>,
    ) -> Option<T> {
        match parse(value) {
            Ok(parsed) => Some(parsed),
            Err(message) => {
                self.errors.push(FieldError::new(field, message));
                None
            }
        }
    }
}

/// The JSON type name of `value`, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse a string whose length in characters is between one and `max_length`.
pub fn parse_text(value: &Value, max_length: usize) -> Result<String, String> {
    let Value::String(text) = value else {
        return Err(format!("Expected string, received {}", type_name(value)));
    };

    let length = text.chars().count();
    if text.trim().is_empty() {
        Err("Must not be empty".to_owned())
    } else if length > max_length {
        Err(format!(
            "Must contain at most {max_length} character(s), received {length}"
        ))
    } else {
        Ok(text.to_owned())
    }
}

/// Parse a string that may be empty.
pub fn parse_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(text) => Ok(text.to_owned()),
        other => Err(format!("Expected string, received {}", type_name(other))),
    }
}

/// Coerce a JSON value to a calendar date.
///
/// Accepts a "YYYY-MM-DD" string, an RFC 3339 date-time string or an integer
/// number of milliseconds since the Unix epoch. Date-times are converted to UTC
/// before the date is taken.
pub fn parse_date(value: &Value) -> Result<Date, String> {
    match value {
        Value::String(text) => coerce_date_str(text).ok_or_else(|| "Invalid date".to_owned()),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| {
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
            })
            .map(|date_time| date_time.date())
            .ok_or_else(|| "Invalid date".to_owned()),
        other => Err(format!("Expected date, received {}", type_name(other))),
    }
}

/// Coerce a date or RFC 3339 date-time string to a calendar date.
pub fn coerce_date_str(text: &str) -> Option<Date> {
    let text = text.trim();

    if let Some(date) = parse_iso_date(text) {
        return Some(date);
    }

    OffsetDateTime::parse(text, &Rfc3339)
        .ok()
        .map(|date_time| date_time.to_offset(UtcOffset::UTC).date())
}

/// Unwrap a JSON request body, turning a rejected body into a validation error
/// on the field `body`.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ValidationErrors> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("rejected request body: {rejection}");
            Err(ValidationErrors(vec![FieldError::new(
                "body",
                rejection.body_text(),
            )]))
        }
    }
}

/// Unwrap the query parameters of a request, turning a rejected query string
/// into a validation error on the field `query`.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ValidationErrors> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => {
            tracing::debug!("rejected query string: {rejection}");
            Err(ValidationErrors(vec![FieldError::new(
                "query",
                rejection.body_text(),
            )]))
        }
    }
}

#[cfg(test)]
mod field_reader_tests {
    use serde_json::json;

    use super::{FieldError, FieldReader, parse_string, parse_text};

    #[test]
    fn rejects_non_object_body() {
        let body = json!([1, 2, 3]);
        let result = FieldReader::new(&body);

        let errors = result.err().expect("want error for array body");
        assert_eq!(
            errors.as_slice(),
            &[FieldError::new("body", "Expected object, received array")]
        );
    }

    #[test]
    fn reports_missing_required_field() {
        let value = json!({});
        let mut reader = FieldReader::new(&value).unwrap();

        let title = reader.required("title", |value| parse_text(value, 10));
        let result = reader.finish(|| title);

        let errors = result.expect_err("want error for missing field");
        assert_eq!(errors.as_slice(), &[FieldError::new("title", "Required")]);
    }

    #[test]
    fn collects_every_error() {
        let value = json!({"title": 1, "description": false});
        let mut reader = FieldReader::new(&value).unwrap();

        let title = reader.required("title", |value| parse_text(value, 10));
        let description = reader.optional("description", parse_string);
        let result = reader.finish(|| Some((title?, description)));

        let errors = result.expect_err("want errors");
        assert!(errors.has_field("title"));
        assert!(errors.has_field("description"));
    }

    #[test]
    fn rejects_owner_field() {
        let value = json!({"userId": "someone-else"});
        let reader = FieldReader::new(&value).unwrap();

        let errors = reader.finish(|| Some(())).expect_err("want error");
        assert!(errors.has_field("userId"));
    }

    #[test]
    fn strips_server_assigned_fields() {
        let value = json!({"id": "abc", "createdAt": "2024-01-01T00:00:00Z"});
        let mut reader = FieldReader::new(&value).unwrap();

        let id = reader.optional("id", parse_string);
        let created_at = reader.patch("createdAt", false, parse_string);

        assert_eq!(id, None);
        assert_eq!(created_at, None);
        assert!(reader.finish(|| Some(())).is_ok());
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let value = json!({"description": null});
        let mut reader = FieldReader::new(&value).unwrap();

        assert_eq!(reader.patch("description", true, parse_string), Some(None));
        assert_eq!(reader.patch("title", true, parse_string), None);
    }

    #[test]
    fn patch_rejects_null_for_non_nullable_field() {
        let value = json!({"title": null});
        let mut reader = FieldReader::new(&value).unwrap();

        let title = reader.patch("title", false, parse_string);

        assert_eq!(title, None);
        assert!(reader.finish(|| Some(())).is_err());
    }
}
