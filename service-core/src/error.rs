use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Body returned for every response, success or failure.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub success: bool,
    pub message: String,
}

impl StatusBody {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Only POST requests are supported";
pub const VALIDATION_MESSAGE: &str = "Name, email and message are required";
pub const PERSISTENCE_MESSAGE: &str = "Internal server error, submission failed";
pub const INTERNAL_MESSAGE: &str = "Internal server error";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body too large";
pub const NOT_FOUND_MESSAGE: &str = "Not found";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    PersistenceError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PersistenceError(_)
            | AppError::InternalError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Only the fixed client-facing text leaves the process; details stay in the log.
        let message = match &self {
            AppError::MethodNotAllowed(method) => {
                tracing::debug!(method = %method, "Rejected request method");
                METHOD_NOT_ALLOWED_MESSAGE.to_string()
            }
            AppError::ValidationError(err) => {
                tracing::debug!(errors = %err, "Rejected invalid submission");
                VALIDATION_MESSAGE.to_string()
            }
            AppError::BadRequest(reason) => {
                tracing::debug!(reason = %reason, "Rejected malformed request");
                VALIDATION_MESSAGE.to_string()
            }
            AppError::PayloadTooLarge(reason) => {
                tracing::debug!(reason = %reason, "Rejected oversized request");
                PAYLOAD_TOO_LARGE_MESSAGE.to_string()
            }
            AppError::NotFound(path) => {
                tracing::debug!(path = %path, "No route matched");
                NOT_FOUND_MESSAGE.to_string()
            }
            AppError::PersistenceError(err) => {
                tracing::error!(error = ?err, "Database operation failed");
                PERSISTENCE_MESSAGE.to_string()
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal error");
                INTERNAL_MESSAGE.to_string()
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = ?err, "Configuration error");
                INTERNAL_MESSAGE.to_string()
            }
        };

        let mut res = (status, Json(StatusBody::failure(message))).into_response();

        if let AppError::MethodNotAllowed(_) = self {
            res.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }

        res
    }
}
