//! Error handling for SHELF HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shelf_kernel::UseCaseError;
use thiserror::Error;
use uuid::Uuid;

use crate::response::Envelope;

/// Message used for every controller-local validation failure.
pub const BAD_REQUEST: &str = "Bad request";

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    /// Input the transport could not accept; never reaches a use-case.
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Failure reported by a use-case; status and message pass through.
    #[error(transparent)]
    UseCase(#[from] UseCaseError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::UseCase(error) => StatusCode::from_u16(error.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let message = match self {
            ApiError::BadRequest { message } | ApiError::Unauthorized { message } => message,
            ApiError::UseCase(error) => error.message,
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                message = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                message = %message,
                "Request rejected"
            );
        }

        (status, Json(Envelope::<()>::Error(message))).into_response()
    }
}
