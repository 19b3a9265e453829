//! Error types for the Courier core library
//!
//! These errors cover construction, configuration and collaborator faults.
//! Request outcomes are never reported through this type: the pipeline turns
//! every outcome into a [`crate::http::ResponseEnvelope`].

use thiserror::Error;

/// Main error type for Courier operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete pipeline configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Credential store read/write/clear failures
    #[error("Credential store error: {message}")]
    Credential {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A request description that violates its own invariants
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Transport construction errors
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a credential store error without a source
    pub fn credential(message: impl Into<String>) -> Self {
        Error::Credential {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("base_url must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: base_url must not be empty"
        );

        let err = Error::invalid_request("multipart request without files");
        assert_eq!(err.to_string(), "Invalid request: multipart request without files");
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().starts_with("JSON error:"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.to_string(), "IO error: missing");
    }
}
