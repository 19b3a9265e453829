//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use courier_core::ErrorCategory;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from courier-core library
    #[error("Core error: {0}")]
    Core(#[from] courier_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The request completed with a failure envelope
    #[error("Request failed ({category}): {message}")]
    RequestFailed {
        category: ErrorCategory,
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::RequestFailed { category, .. } => request_exit_code(*category),
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Exit codes for failed requests, one per category
fn request_exit_code(category: ErrorCategory) -> i32 {
    match category {
        ErrorCategory::Network => 20,
        ErrorCategory::Timeout => 21,
        ErrorCategory::Unauthorized => 22,
        ErrorCategory::Forbidden => 23,
        ErrorCategory::NotFound => 24,
        ErrorCategory::Validation => 25,
        ErrorCategory::Api => 26,
        ErrorCategory::Server => 27,
        ErrorCategory::Unknown => 28,
        // Conventional exit status for SIGINT
        ErrorCategory::Cancelled => 130,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let categories = [
            ErrorCategory::Network,
            ErrorCategory::Timeout,
            ErrorCategory::Cancelled,
            ErrorCategory::Unauthorized,
            ErrorCategory::Forbidden,
            ErrorCategory::NotFound,
            ErrorCategory::Validation,
            ErrorCategory::Server,
            ErrorCategory::Api,
            ErrorCategory::Unknown,
        ];
        let mut codes: Vec<i32> = categories.iter().map(|c| request_exit_code(*c)).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), categories.len());
        assert!(codes.iter().all(|c| *c != 0));
    }

    #[test]
    fn test_request_failed_display() {
        let err = Error::RequestFailed {
            category: ErrorCategory::NotFound,
            message: "The requested resource was not found: /x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed (NOT_FOUND): The requested resource was not found: /x"
        );
        assert_eq!(err.exit_code(), 24);
    }

    #[test]
    fn test_format_error_plain() {
        let err = Error::config("missing base_url");
        assert_eq!(
            format_error(&err, false),
            "Error: Configuration error: missing base_url"
        );
        assert!(!err.should_show_help());
        assert!(Error::invalid_args("x").should_show_help());
    }
}
