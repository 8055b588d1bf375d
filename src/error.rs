//! Error type shared by all handlers.
//!
//! Every failure a request can hit ends up as an [`AppError`], which knows
//! its HTTP status and renders as `{"code": ..., "detail": ...}`.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// Postgres SQLSTATE codes we translate into client errors
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Unique constraint that keeps one ticket per seat and session.
pub const SEAT_CONSTRAINT: &str = "tickets_session_row_seat_key";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("Authentication credentials were not provided or are invalid.")]
    AuthenticationRequired,

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    detail: String,
}

impl AppError {
    pub fn not_found(resource: &str, id: i64) -> Self {
        AppError::NotFound(format!("{resource} with id {id} not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::AuthenticationRequired => "NOT_AUTHENTICATED",
            AppError::Database(_) | AppError::Io(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internals stay in the log, the client gets a generic message
        let detail = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return AppError::NotFound("Not found.".to_string());
        }

        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Validation(unique_violation_message(constraint));
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::Validation(format!(
                        "Referenced object does not exist ({constraint})."
                    ));
                }
                Some(CHECK_VIOLATION) => {
                    return AppError::Validation(format!("Value out of range ({constraint})."));
                }
                Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                    return AppError::Validation(
                        "The request conflicted with a concurrent update, please retry.".to_string(),
                    );
                }
                _ => {}
            }
        }

        AppError::Database(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

// Extractor rejections are client errors in our taxonomy

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::NotFound(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(err.body_text())
    }
}

/// True when `err` is a violation of the one-ticket-per-seat constraint.
pub fn is_seat_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db_err| {
        db_err.code().as_deref() == Some(UNIQUE_VIOLATION) && db_err.constraint() == Some(SEAT_CONSTRAINT)
    })
}

fn unique_violation_message(constraint: &str) -> String {
    match constraint {
        "genres_name_key" => "Genre with this name already exists.".to_string(),
        SEAT_CONSTRAINT => {
            "One of the requested seats is already taken for this session.".to_string()
        }
        other => format!("Duplicate value violates {other}."),
    }
}
