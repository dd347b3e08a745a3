use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hook_codegen::GenerateError;
use hook_store::{InvalidCaptureId, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    InvalidId(#[from] InvalidCaptureId),
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("{}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),
    #[error("Webhook not found.")]
    NotFound,
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("capture store failed: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::InvalidId(_)
            | ApiError::InvalidBody(_)
            | ApiError::InvalidQuery(_)
            | ApiError::Generate(GenerateError::EmptyInput) => StatusCode::BAD_REQUEST,

            ApiError::NotFound => StatusCode::NOT_FOUND,

            ApiError::Generate(GenerateError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Store(error) if error.is_transient() => StatusCode::SERVICE_UNAVAILABLE,

            ApiError::Generate(GenerateError::Emission(_)) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
