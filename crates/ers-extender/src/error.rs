use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ers_scheduler::SchedulerError;
use ers_storage::StorageError;

/// API error type. The response body is the plain error message.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input (400)
    BadRequest(String),

    /// Referenced object not found (404)
    NotFound(String),

    /// Object already exists or changed concurrently (409)
    Conflict(String),

    /// Internal server error (500)
    Internal(String),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, message).into_response()
    }
}

/// Bind failures are reported to the scheduler as client errors
impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match &err {
            SchedulerError::StorageError(StorageError::KeyNotFound { .. }) => {
                ApiError::NotFound(err.to_string())
            }
            SchedulerError::StorageError(
                StorageError::AlreadyExists { .. } | StorageError::Conflict { .. },
            ) => ApiError::Conflict(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}
