//! HTTP error responses.
//!
//! Every failure is returned as `{"error": "<message>"}`.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::backup::BackupError;
use crate::collections::CollectionError;
use crate::images::ImageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// Error body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Collection(CollectionError::UnknownCollection(_)) => StatusCode::BAD_REQUEST,
            ApiError::Collection(CollectionError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Collection(CollectionError::SaveFailed) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Image(ImageError::Io(..)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Image(_) => StatusCode::BAD_REQUEST,
            ApiError::Backup(BackupError::MissingStore(_)) => StatusCode::NOT_FOUND,
            ApiError::Backup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to clients. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            ApiError::Collection(CollectionError::NotFound { .. }) => "Item not found".to_string(),
            ApiError::Image(ImageError::Io(..)) => "Failed to save image".to_string(),
            ApiError::Backup(BackupError::MissingStore(_)) => "No data file to back up".to_string(),
            ApiError::Backup(_) => "Failed to create backup".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}: {}", status, self);
        }
        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
