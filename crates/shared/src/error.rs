//! Application-wide error types.
//!
//! Wallet domain failures have their own taxonomy in `saku-core`; this type
//! covers everything around it (authentication, routing, rate management).

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to perform the action.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persistence layer failure.
    #[error("Database error: {0}")]
    Database(String),

    /// The identity service could not be reached or answered garbage.
    #[error("Identity service error: {0}")]
    IdentityService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::IdentityService(_) => 502,
            Self::Database(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "ERR_UNAUTHORIZED",
            Self::Forbidden(_) => "ERR_FORBIDDEN",
            Self::NotFound(_) => "ERR_NOT_FOUND",
            Self::Validation(_) => "ERR_VALIDATION",
            Self::Conflict(_) => "ERR_CONFLICT",
            Self::Database(_) => "ERR_STORE_UNAVAILABLE",
            Self::IdentityService(_) => "ERR_IDENTITY_SERVICE",
            Self::Internal(_) => "ERR_INTERNAL",
        }
    }
}
