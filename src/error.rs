//! Custom error types for checkdesk
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for checkdesk operations
#[derive(Error, Debug)]
pub enum CheckdeskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// SQLite errors not mapped to a more specific variant
    #[error("Database error: {0}")]
    Database(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The current user's role lacks a permission
    #[error("Permission denied: role '{role}' cannot {permission}")]
    PermissionDenied { role: String, permission: String },

    /// Login, session and lockout failures
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Encryption errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Storage errors (schema, backups, restore)
    #[error("Storage error: {0}")]
    Storage(String),

    /// TUI errors
    #[error("TUI error: {0}")]
    Tui(String),
}

impl CheckdeskError {
    /// Create a "not found" error for banks
    pub fn bank_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Bank",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for branches
    pub fn branch_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Branch",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for clients
    pub fn client_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Client",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for checks
    pub fn check_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Check",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for notifications
    pub fn notification_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Notification",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a permission error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for CheckdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CheckdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<rusqlite::Error> for CheckdeskError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<csv::Error> for CheckdeskError {
    fn from(err: csv::Error) -> Self {
        Self::Io(format!("CSV: {}", err))
    }
}

/// Result type alias for checkdesk operations
pub type CheckdeskResult<T> = Result<T, CheckdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CheckdeskError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = CheckdeskError::check_not_found("1234567");
        assert_eq!(err.to_string(), "Check not found: 1234567");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_permission_denied_error() {
        let err = CheckdeskError::PermissionDenied {
            role: "readonly".into(),
            permission: "check.create".into(),
        };
        assert_eq!(
            err.to_string(),
            "Permission denied: role 'readonly' cannot check.create"
        );
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CheckdeskError = io_err.into();
        assert!(matches!(err, CheckdeskError::Io(_)));
    }

    #[test]
    fn test_from_sqlite_error() {
        let err: CheckdeskError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, CheckdeskError::Database(_)));
    }
}
