use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Record not found")]
    RecordNotFound(i64),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::InvalidField { .. }
            | AppError::ConstraintViolation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::StorageUnavailable(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// CHECK failures come from the status column; everything else stays a storage error.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.kind() == ErrorKind::CheckViolation {
                return AppError::ConstraintViolation(db_err.message().to_string());
            }
        }

        if matches!(
            err,
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
        ) {
            return AppError::StorageUnavailable(err.to_string());
        }

        AppError::Database(err)
    }
}

// Convert AppError to an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type Result<T> = std::result::Result<T, AppError>;
