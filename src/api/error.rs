//! Actix Web error adapters for Galena errors.
//!
//! This module implements the Actix Web error traits for the library error
//! types so handlers can return them directly.

use crate::error::{Error, ErrorKind, ValidationErrors};
use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode};
use serde::Serialize;

/// JSON body of every error response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody<'a> {
    pub error_type: &'a str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<&'a ValidationErrors>,
}

fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(status_code).json(ErrorBody {
            error_type: self.type_name(),
            message: self.to_string(),
            validation: self.validation(),
        })
    }

    fn status_code(&self) -> StatusCode {
        kind_status(self.kind())
    }
}

/// Errors raised by the request layer itself, before the core is reached
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Core(#[from] Error),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::InvalidRequest(_) => {
                HttpResponse::build(self.status_code()).json(ErrorBody {
                    error_type: "InvalidRequest",
                    message: self.to_string(),
                    validation: None,
                })
            }
            ApiError::Core(e) => e.error_response(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(e) => e.status_code(),
        }
    }
}

/// Turn body extraction failures (bad JSON, unknown or mistyped fields) into 400s
pub(crate) fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(path = %req.path(), error = %err, "Rejected request body");
    ApiError::InvalidRequest(err.to_string()).into()
}
