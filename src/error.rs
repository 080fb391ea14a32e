//! Defines the app level error type and its conversion to JSON responses.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// Per-field validation messages, keyed by the offending field name.
///
/// Field order is kept stable (sorted) so error bodies are deterministic.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of field errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation message against `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether any field has an error recorded against it.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` has an error recorded against it.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Turn the accumulated messages into a result: `Ok` when no field
    /// failed, otherwise [Error::Validation].
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A request body failed field validation. Carries per-field detail.
    #[error("invalid data")]
    Validation(FieldErrors),

    /// The request body could not be parsed as JSON.
    #[error("invalid json")]
    MalformedRequest,

    /// The request had no `Authorization` header on a route that requires one.
    #[error("Authorization header missing")]
    MissingAuthHeader,

    /// The bearer token was malformed, had a bad signature or has expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The username was unknown or the password comparison failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The principal is authenticated but lacks the admin role.
    ///
    /// Returned with status 401 rather than 403 for compatibility with
    /// existing clients.
    #[error("Insufficient authorization")]
    InsufficientAuthorization,

    /// A slug path parameter exceeded the maximum length. Rejected before
    /// any store lookup.
    #[error("Slug is too long")]
    SlugTooLong,

    /// The requested resource was not found. Carries the entity label used
    /// in the response body, e.g. "Transaction".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The username chosen during registration already exists.
    #[error("the username is already taken")]
    DuplicateUsername,

    /// A multipart upload arrived without a file part.
    #[error("No file provided")]
    MissingUploadFile,

    /// The uploaded file's media type is not in the configured allow-list.
    /// Carries the rejection message for the active list.
    #[error("{0}")]
    UnsupportedMediaType(&'static str),

    /// The uploaded file exceeded the configured size ceiling (bytes).
    #[error("the file must be at most {0} bytes")]
    UploadTooLarge(usize),

    /// The external object storage service rejected or failed an upload.
    ///
    /// The message is for server logs only and is never returned to the
    /// client.
    #[error("object storage upload failed: {0}")]
    ObjectStorage(String),

    /// Signing a token failed.
    #[error("could not create token")]
    TokenCreation,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("users.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("Resource"),
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid data", "errors": fields })),
            )
                .into_response(),
            Error::MalformedRequest => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid json" })),
            )
                .into_response(),
            Error::MissingAuthHeader | Error::InvalidToken | Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            Error::InsufficientAuthorization => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Insufficient authorization" })),
            )
                .into_response(),
            Error::SlugTooLong => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Slug is too long" })),
            )
                .into_response(),
            Error::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": format!("{entity} not found") })),
            )
                .into_response(),
            Error::DuplicateUsername => {
                let mut fields = FieldErrors::new();
                fields.push("username", "the username is already taken");
                Error::Validation(fields).into_response()
            }
            Error::MissingUploadFile => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No file provided" })),
            )
                .into_response(),
            Error::UnsupportedMediaType(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Error::UploadTooLarge(max_bytes) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("The file must be at most {max_bytes} bytes")
                })),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
