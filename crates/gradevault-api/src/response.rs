//! Uniform response envelope and error-to-status mapping
//!
//! Every externally-facing failure reduces to a short human-readable message
//! plus an unsuccessful status; internal details never reach the caller.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::Value;

use gradevault_common::error::{AuthError, Error, StorageError};

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Successful response with no data (e.g. select matched nothing)
    pub fn empty() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }
}

impl ApiResponse<Value> {
    /// Failed response carrying only a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Map an error to its HTTP response
pub fn error_response(e: &Error) -> HttpResponse {
    let status = status_for(e);
    let message = message_for(e);
    HttpResponse::build(status).json(ApiResponse::error(message))
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::Query(_) => StatusCode::BAD_REQUEST,
        Error::Storage(StorageError::DuplicateRecord(_)) => StatusCode::CONFLICT,
        Error::Auth(AuthError::AccessDenied(_)) => StatusCode::FORBIDDEN,
        Error::Auth(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for(e: &Error) -> String {
    match e {
        // Stack traces and driver internals stay inside; the gateway already
        // reduced storage failures to a stable kind plus message
        Error::Storage(StorageError::DuplicateRecord(_)) => "record already exists".to_string(),
        Error::Internal(_) | Error::Io(_) | Error::Serialization(_) => {
            "internal error".to_string()
        }
        other => other.to_string(),
    }
}
