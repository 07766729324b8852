//! Mapping from domain errors to HTTP responses.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use teamup_core::{Error, LimitSide, MAX_CONNECTIONS};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Error returned from handlers. Rendered as `{ "message": ... }`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) | Error::NoSuchRequest => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message. Internal failures are not described.
    pub fn message(&self) -> String {
        match &self.0 {
            Error::NotFound(_) => "User not found".to_string(),
            Error::LimitExceeded(LimitSide::Own) => format!(
                "You have reached the maximum limit of {} connections",
                MAX_CONNECTIONS
            ),
            Error::LimitExceeded(LimitSide::Target) => {
                "This user has reached their connection limit".to_string()
            }
            Error::LimitExceeded(LimitSide::Requester) => {
                "The other user has reached their connection limit".to_string()
            }
            Error::Validation(detail) => detail.clone(),
            e if e.is_client_error() => e.to_string(),
            _ => "Server error".to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

// Extractor failures (bad JSON, missing fields, non-numeric path ids) are
// reported like any other validation error.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(Error::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(serde_json::json!({ "message": self.message() }))).into_response()
    }
}
