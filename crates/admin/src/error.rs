//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use univendor_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::StorageError;
use crate::variants::{EditorError, SaveError};

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Image storage failed.
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Input failed validation; the body carries the field messages.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Some variants of a save were not persisted.
    #[error("Saved {succeeded} of {total} variants: {source}")]
    PartialSave {
        succeeded: usize,
        failed: usize,
        total: usize,
        source: RepositoryError,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with stored state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("record".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(_) => Self::Storage(err),
            rejected => Self::BadRequest(rejected.to_string()),
        }
    }
}

impl From<EditorError> for AppError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Validation(errors) => Self::Validation(errors),
            EditorError::ReservedAttribute(_) => Self::BadRequest(err.to_string()),
            EditorError::UnknownAttribute(_)
            | EditorError::NoSuchValue { .. }
            | EditorError::NoSuchVariant(_)
            | EditorError::Image(_) => Self::NotFound(err.to_string()),
        }
    }
}

impl From<SaveError> for AppError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Validation(errors) => Self::Validation(errors),
            SaveError::Persistence {
                succeeded,
                failed,
                total,
                source,
            } => Self::PartialSave {
                succeeded,
                failed,
                total,
                source,
            },
            SaveError::Closed => Self::Conflict(SaveError::Closed.to_string()),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Storage(_) | Self::PartialSave { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(fields) => json!({
                "error": "Validation failed",
                "fields": fields,
            }),
            Self::PartialSave {
                succeeded, failed, ..
            } => json!({
                "error": "Failed to save variants",
                "succeeded": succeeded,
                "failed": failed,
            }),
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => json!({
                "error": "Internal server error",
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("variant 12".to_string());
        assert_eq!(err.to_string(), "Not found: variant 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationErrors::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_map_to_client_statuses() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("two defaults".to_string())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::DataCorruption("bad json".to_string())),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_storage_rejections_are_bad_requests() {
        assert!(matches!(
            AppError::from(StorageError::UnsupportedType("exe".to_string())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(StorageError::Io(std::io::Error::other("disk full"))),
            AppError::Storage(_)
        ));
    }

    #[test]
    fn test_editor_errors_map() {
        let mut fields = ValidationErrors::new();
        fields.insert("matrix", "Both color and size must have at least one value");
        assert!(matches!(
            AppError::from(EditorError::Validation(fields)),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(EditorError::NoSuchVariant(4)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(EditorError::ReservedAttribute("Color".to_string())),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_partial_save_status() {
        let err = AppError::from(SaveError::Persistence {
            succeeded: 2,
            failed: 1,
            total: 3,
            source: RepositoryError::Conflict("duplicate sku".to_string()),
        });
        assert_eq!(err.to_string(), "Saved 2 of 3 variants: constraint violation: duplicate sku");
        assert_eq!(get_status(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_repeated_save_is_conflict() {
        let err = AppError::from(SaveError::Closed);
        assert_eq!(err.to_string(), "Conflict: editor session already saved");
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }
}
