//! Application-wide error types.
//!
//! `AppError` is the boundary error handed to whatever transport sits in front
//! of the engine. Engine errors convert into it so callers can map failures to
//! status codes without matching on engine internals.

use thiserror::Error;

use crate::types::SegmentValueError;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (malformed input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Impossible or ambiguous configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Conflict (e.g., duplicate entry, counter race).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Configuration(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<SegmentValueError> for AppError {
    fn from(err: SegmentValueError) -> Self {
        Self::Validation(err.to_string())
    }
}
