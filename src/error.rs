//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::validation::{FieldError, ValidationErrors};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body or query string failed validation.
    ///
    /// The client should correct the fields listed in the error and try again.
    #[error("invalid input data: {0}")]
    Validation(ValidationErrors),

    /// The request did not carry a valid, unexpired session.
    #[error("the request is not authenticated")]
    Unauthorized,

    /// The authenticated caller does not own the requested resource.
    #[error("the caller does not own the requested resource")]
    AccessDenied,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request body is larger than the server accepts.
    #[error("the request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// A budget already exists for the same user, category and month.
    #[error("a budget already exists for this category and month")]
    DuplicateBudget,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing or deserializing a value as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// Create a validation error for a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Error::Validation(ValidationErrors::from(vec![FieldError::new(field, message)]))
    }
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        Error::Validation(value)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067
                    && desc.starts_with("UNIQUE constraint failed: budget.") =>
            {
                Error::DuplicateBudget
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            message,
            errors: None,
        }),
    )
        .into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    message: "Invalid input data",
                    errors: Some(errors.as_slice()),
                }),
            )
                .into_response(),
            Error::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "Unauthorized"),
            Error::AccessDenied => json_error(StatusCode::FORBIDDEN, "Access denied"),
            Error::NotFound => json_error(StatusCode::NOT_FOUND, "Not found"),
            Error::BodyTooLarge(_) => {
                json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body is too large")
            }
            Error::DuplicateBudget => json_error(
                StatusCode::CONFLICT,
                "A budget already exists for this category and month",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::{Value, json};

    use crate::Error;

    async fn body_json(error: Error) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("could not read response body");

        (status, serde_json::from_slice(&bytes).expect("body is not JSON"))
    }

    #[tokio::test]
    async fn validation_error_lists_fields() {
        let (status, body) = body_json(Error::invalid_field("amount", "Required")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "message": "Invalid input data",
                "errors": [{"field": "amount", "message": "Required"}]
            })
        );
    }

    #[tokio::test]
    async fn maps_status_codes() {
        assert_eq!(body_json(Error::Unauthorized).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(Error::AccessDenied).await.0, StatusCode::FORBIDDEN);
        assert_eq!(body_json(Error::NotFound).await.0, StatusCode::NOT_FOUND);
        assert_eq!(body_json(Error::DuplicateBudget).await.0, StatusCode::CONFLICT);
        assert_eq!(
            body_json(Error::BodyTooLarge(1)).await.0,
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) =
            body_json(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"message": "Something went wrong"}));
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
