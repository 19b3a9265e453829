//! Transport abstraction consumed by the pipeline
//!
//! A transport executes exactly one wire-level call per [`TransportRequest`].
//! It returns the response for 2xx statuses and a [`TransportFault`] for
//! everything else, including non-2xx responses.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::error::TransportFault;
use super::multipart::MultipartPayload;
use super::request::ProgressCallback;

/// Wire-level method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl TransportMethod {
    pub fn as_method(&self) -> Method {
        match self {
            TransportMethod::Get => Method::GET,
            TransportMethod::Post => Method::POST,
            TransportMethod::Put => Method::PUT,
            TransportMethod::Patch => Method::PATCH,
            TransportMethod::Delete => Method::DELETE,
        }
    }
}

/// Prepared request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(MultipartPayload),
}

impl RequestBody {
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::Multipart(_) => Some("multipart/form-data"),
        }
    }
}

/// Everything a transport needs for one call
#[derive(Clone)]
pub struct TransportRequest {
    pub method: TransportMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub cancellation: CancellationToken,
    pub on_send_progress: Option<ProgressCallback>,
    pub on_receive_progress: Option<ProgressCallback>,
}

impl TransportRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Successful response
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// JSON body, a JSON string for non-JSON text, or `None` when empty
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }
}

/// Generic HTTP client used by the pipeline
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportFault>;
}

/// Decode a raw body: JSON when it parses, otherwise UTF-8 text
pub fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(bytes).into_owned())))
}
