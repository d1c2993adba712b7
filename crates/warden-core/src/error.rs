//! Core error types for warden.
//!
//! [`WardenError`] covers the failures of the collaborators around the token
//! core: configuration problems, user store failures, serialization errors,
//! and I/O. Token verification failures have their own taxonomy in
//! `warden_auth::tokens::TokenError`, and signature failures are reported as
//! [`SigningError`](crate::signing::SigningError).

use thiserror::Error;

/// The primary error type for warden.
#[derive(Error, Debug)]
pub enum WardenError {
    // ── Lookup ───────────────────────────────────────────────────────

    /// The requested record does not exist.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// The record conflicts with an existing one (for example a duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    // ── Persistence ──────────────────────────────────────────────────

    /// A generic user store error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The service was assembled with an inconsistent configuration.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── Internal ─────────────────────────────────────────────────────

    /// An unexpected internal failure (e.g. a blocking task was cancelled).
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A convenience type alias for `Result<T, WardenError>`.
pub type WardenResult<T> = Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warden_error_display() {
        let err = WardenError::DoesNotExist("user 42".into());
        assert_eq!(err.to_string(), "Object does not exist: user 42");
        assert_eq!(
            WardenError::Conflict("joe@lp.com".into()).to_string(),
            "Conflict: joe@lp.com"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let warden_err: WardenError = io_err.into();
        assert!(matches!(warden_err, WardenError::IoError(_)));
        assert!(warden_err.to_string().contains("file missing"));
    }
}
