// src/error.rs

use std::{fmt, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    clients::{openai::GenerationError, storage::StorageError},
    repository::PersistenceError,
};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 422 Unprocessable Entity (document or generated content unusable)
    Unprocessable(String),

    // 502 Bad Gateway (text-generation collaborator failed)
    BadGateway(String),

    // 504 Gateway Timeout
    Timeout(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Failures of the exam workflow (ingest → extract → synthesize → quiz → grade).
///
/// Every variant is scoped to one interaction: the handler reports it and
/// records committed before the failure are left in place.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Bad input detected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Oversized upload; a validation failure with its own status.
    #[error("file of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("could not extract text from document: {0}")]
    Extraction(String),

    #[error("question generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("generated candidate {candidate} is malformed: {reason}")]
    MalformedGeneration { candidate: usize, reason: String },

    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("no questions available for exam {0}")]
    NoQuestions(i64),

    #[error("exam {0} not found")]
    ExamNotFound(i64),

    /// Regeneration only runs for exams left without questions.
    #[error("exam {0} already has questions")]
    QuestionsExist(i64),

    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::Validation(_) => AppError::BadRequest(message),
            WorkflowError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(message),
            WorkflowError::Extraction(_)
            | WorkflowError::MalformedGeneration { .. }
            | WorkflowError::NoQuestions(_) => AppError::Unprocessable(message),
            WorkflowError::Generation(_) => AppError::BadGateway(message),
            WorkflowError::Timeout { .. } => AppError::Timeout(message),
            WorkflowError::ExamNotFound(_) => AppError::NotFound(message),
            WorkflowError::QuestionsExist(_)
            | WorkflowError::Storage(StorageError::Conflict(_)) => AppError::Conflict(message),
            WorkflowError::Persistence(_) | WorkflowError::Storage(_) => {
                AppError::InternalServerError(message)
            }
        }
    }
}
