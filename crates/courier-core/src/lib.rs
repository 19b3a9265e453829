//! Courier Core - Authenticated request pipeline for JSON HTTP APIs
//!
//! This crate wraps a generic HTTP transport with credential handling,
//! error classification and a uniform response envelope.
//!
//! # Main Components
//!
//! - **Credentials**: Bearer credentials, persistence and optional refresh
//! - **Endpoint classification**: Public paths are sent without a credential
//! - **Error taxonomy**: Every failure maps to one [`ErrorCategory`]
//! - **Request pipeline**: One call in, one [`ResponseEnvelope`] out
//! - **Multipart**: Form fields and files assembled into one payload
//!
//! # Example
//!
//! ```no_run
//! use courier_core::{MemoryCredentialStore, PipelineConfig, RequestPipeline, Result};
//! use std::sync::Arc;
//!
//! async fn example() -> Result<()> {
//!     let config = PipelineConfig::new("https://api.example.com")
//!         .with_public_endpoints(["/auth/login"]);
//!     let pipeline = RequestPipeline::new(config, Arc::new(MemoryCredentialStore::new()))?;
//!
//!     let envelope = pipeline.get::<serde_json::Value>("/users/1").await;
//!     if !envelope.is_success() {
//!         eprintln!("{:?}: {:?}", envelope.error_type(), envelope.message());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod http;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use credential::{
    Credential, CredentialRefresher, CredentialStore, FileCredentialStore, MemoryCredentialStore,
};
pub use error::{Error, Result};
pub use http::{
    classify, ErrorCategory, Failure, FileUpload, HttpMethod, MultipartBuilder, PublicEndpoints,
    RequestDescription, RequestPipeline, ResponseEnvelope, Transport, TransportFault,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_error_creation() {
        let err = Error::Configuration {
            message: "Test error".to_string(),
            source: None,
        };
        assert!(err.to_string().contains("Test error"));
    }
}
