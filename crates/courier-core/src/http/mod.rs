//! Authenticated HTTP request pipeline
//!
//! This module provides:
//! - Request descriptions and multipart payload assembly
//! - Bearer credential attachment for private endpoints
//! - Transport fault classification into a fixed error taxonomy
//! - A uniform response envelope for every outcome

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod multipart;
pub mod reqwest_transport;
pub mod request;
pub mod transport;

pub use auth::{redact_headers, Authenticator};
pub use client::RequestPipeline;
pub use endpoint::PublicEndpoints;
pub use envelope::ResponseEnvelope;
pub use error::{classify, ErrorCategory, Failure, TransportFault};
pub use multipart::{MultipartBuilder, MultipartPart, MultipartPayload};
pub use reqwest_transport::ReqwestTransport;
pub use request::{FileUpload, HttpMethod, ProgressCallback, RequestDescription};
pub use transport::{RequestBody, Transport, TransportMethod, TransportRequest, TransportResponse};
