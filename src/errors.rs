use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::admission::AdmissionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Machine-readable error kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "storage",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Admission(e) => match e {
                AdmissionError::InvalidService => "invalid_service",
                AdmissionError::InvalidStaff => "invalid_staff",
                AdmissionError::SlotUnavailable => "slot_unavailable",
                AdmissionError::InvalidTransition { .. } => "invalid_transition",
                AdmissionError::NotFound => "not_found",
                AdmissionError::Storage(_) => "storage",
            },
            AppError::Internal(_) => "storage",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Admission(e) => match e {
                AdmissionError::InvalidService | AdmissionError::InvalidStaff => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AdmissionError::SlotUnavailable | AdmissionError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                AdmissionError::NotFound => StatusCode::NOT_FOUND,
                AdmissionError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
