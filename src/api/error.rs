use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keystone_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Core(e) => match e {
                CoreError::ProjectNotFound(_)
                | CoreError::CitationNotFound(_)
                | CoreError::ItemNotFound(_)
                | CoreError::MemberNotFound(_) => {
                    (StatusCode::NOT_FOUND, json!({ "error": e.to_string() }))
                }
                CoreError::VersionConflict { expected, actual } => (
                    StatusCode::CONFLICT,
                    json!({
                        "error": e.to_string(),
                        "expected_version": expected,
                        "current_version": actual,
                    }),
                ),
                CoreError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
                }
                CoreError::Incomplete(missing) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": e.to_string(), "missing": missing }),
                ),
                _ => {
                    tracing::error!(error = %e, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": "internal error" }),
                    )
                }
            },
            ApiError::Storage(StorageError::InvalidKey(_)) => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "storage error" }),
                )
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };
        (status, Json(body)).into_response()
    }
}
