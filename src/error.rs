use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::reports::ReportError;
use crate::storage::StorageError;
use crate::validation::ValidationErrors;

/// JSON body shared by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub(crate) fn error_response(
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
) -> Response {
    let body = ErrorBody {
        error: code,
        message,
        details,
    };
    (status, Json(body)).into_response()
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("At most {0} active goals are allowed")]
    GoalLimitReached(i64),
    #[error("At most {0} attachments are allowed for this entry")]
    MediaLimitReached(i64),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("File exceeds the limit of {limit} bytes")]
    FileTooLarge { limit: u64 },
    #[error("Invalid file path")]
    InvalidPath,
    #[error("Default training types cannot be modified")]
    DefaultTypeProtected,
    #[error("A training type with this name already exists")]
    DuplicateName,
    #[error("Training type is used by existing trainings")]
    TypeInUse,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage error: {0}")]
    Storage(StorageError),
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(_) => ApiError::InvalidPath,
            StorageError::NotFound(_) => ApiError::NotFound("File"),
            other => ApiError::Storage(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::GoalLimitReached(_)
            | ApiError::MediaLimitReached(_)
            | ApiError::UnsupportedMediaType(_)
            | ApiError::InvalidPath
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::DefaultTypeProtected => StatusCode::FORBIDDEN,
            ApiError::DuplicateName | ApiError::TypeInUse => StatusCode::CONFLICT,
            ApiError::Auth(err) => err.status(),
            ApiError::Database(_)
            | ApiError::Storage(_)
            | ApiError::Report(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::GoalLimitReached(_) => "GOAL_LIMIT_REACHED",
            ApiError::MediaLimitReached(_) => "MEDIA_LIMIT_REACHED",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ApiError::InvalidPath => "INVALID_PATH",
            ApiError::DefaultTypeProtected => "DEFAULT_TYPE_PROTECTED",
            ApiError::DuplicateName => "DUPLICATE_NAME",
            ApiError::TypeInUse => "TYPE_IN_USE",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Auth(err) => err.code(),
            ApiError::Database(_)
            | ApiError::Storage(_)
            | ApiError::Report(_)
            | ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        match self {
            ApiError::Auth(err) => err.into_response(),
            ApiError::Validation(errors) => error_response(
                status,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                serde_json::to_value(&errors).ok(),
            ),
            other if status.is_server_error() => error_response(
                status,
                other.code(),
                "Internal server error".to_string(),
                None,
            ),
            other => {
                let message = other.to_string();
                error_response(status, other.code(), message, None)
            }
        }
    }
}

/// Postgres `foreign_key_violation`.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

/// Postgres `unique_violation`.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::invalid_field;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound("Training").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::GoalLimitReached(5).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::GoalLimitReached(5).code(), "GOAL_LIMIT_REACHED");
        assert_eq!(ApiError::DefaultTypeProtected.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::TypeInUse.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::FileTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_errors_map_to_client_errors() {
        let err: ApiError = StorageError::InvalidKey("../etc/passwd".to_string()).into();
        assert_eq!(err.code(), "INVALID_PATH");

        let err: ApiError = StorageError::NotFound("a/b.png".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_details_are_keyed_by_field() {
        let err: ApiError = invalid_field("month", "range", "must be between 1 and 12").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_errors_keep_their_status() {
        let err: ApiError = AuthError::MissingAuthHeader.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
