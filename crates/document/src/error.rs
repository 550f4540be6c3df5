//! Error types for JSON:API encoding and decoding.
//!
//! Every failure the engine can report belongs to one of six categories, each
//! of which maps to an HTTP status code and renders as a JSON:API error object.
//!
//! # Error Mapping
//!
//! | Variant | HTTP Status | Raised when |
//! |---------|-------------|-------------|
//! | BadRequest | 400 | Query parameters are malformed |
//! | Forbidden | 403 | The operation is not permitted |
//! | NotFound | 404 | A resource type or id does not resolve |
//! | NotAcceptable | 406 | Content negotiation fails |
//! | UnprocessableEntity | 422 | A request document has the wrong shape |
//! | Runtime | 500 | Misconfiguration (unmapped schema, relation mismatch) |

// Variant fields and constructors are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// The error type for all JSON:API operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonApiError {
    /// Malformed query parameters (HTTP 400).
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// Structurally invalid resource document (HTTP 422).
    #[error("unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    /// Content negotiation failure (HTTP 406).
    #[error("not acceptable: {message}")]
    NotAcceptable { message: String },

    /// The resource type or id does not resolve (HTTP 404).
    #[error("resource not found: {resource_type}/{id}")]
    NotFound { resource_type: String, id: String },

    /// The operation was denied (HTTP 403).
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Internal contract violation, not recoverable by the caller (HTTP 500).
    #[error("runtime error: {message}")]
    Runtime { message: String },
}

impl JsonApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        JsonApiError::BadRequest {
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        JsonApiError::UnprocessableEntity {
            message: message.into(),
        }
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        JsonApiError::NotAcceptable {
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        JsonApiError::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        JsonApiError::Forbidden {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        JsonApiError::Runtime {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            JsonApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            JsonApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            JsonApiError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            JsonApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            JsonApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            JsonApiError::Runtime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the short, human-readable title of the error category.
    pub fn title(&self) -> &'static str {
        match self {
            JsonApiError::BadRequest { .. } => "Bad Request",
            JsonApiError::UnprocessableEntity { .. } => "Unprocessable Entity",
            JsonApiError::NotAcceptable { .. } => "Not Acceptable",
            JsonApiError::NotFound { .. } => "Not Found",
            JsonApiError::Forbidden { .. } => "Forbidden",
            JsonApiError::Runtime { .. } => "Internal Server Error",
        }
    }

    /// Returns the occurrence-specific detail message.
    pub fn detail(&self) -> String {
        match self {
            JsonApiError::BadRequest { message }
            | JsonApiError::UnprocessableEntity { message }
            | JsonApiError::NotAcceptable { message }
            | JsonApiError::Forbidden { message }
            | JsonApiError::Runtime { message } => message.clone(),
            JsonApiError::NotFound { resource_type, id } if id.is_empty() => {
                format!("Resource type '{}' is not available", resource_type)
            }
            JsonApiError::NotFound { resource_type, id } => {
                format!("Resource {}/{} not found", resource_type, id)
            }
        }
    }

    /// Renders this error as a JSON:API error object.
    pub fn to_error_object(&self) -> Value {
        json!({
            "status": self.status().as_u16().to_string(),
            "title": self.title(),
            "detail": self.detail(),
        })
    }
}

/// Creates an error document holding one error object per error.
pub fn error_document(errors: &[JsonApiError]) -> Value {
    json!({
        "errors": errors.iter().map(JsonApiError::to_error_object).collect::<Vec<_>>()
    })
}

impl From<serde_json::Error> for JsonApiError {
    fn from(err: serde_json::Error) -> Self {
        JsonApiError::UnprocessableEntity {
            message: format!("Invalid JSON: {}", err),
        }
    }
}

impl From<url::ParseError> for JsonApiError {
    fn from(err: url::ParseError) -> Self {
        JsonApiError::Runtime {
            message: format!("Invalid base URL: {}", err),
        }
    }
}

/// Result type alias for JSON:API operations.
pub type JsonApiResult<T> = Result<T, JsonApiError>;
