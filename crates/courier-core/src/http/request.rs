//! Request descriptions submitted to the pipeline

use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Progress callback: bytes transferred so far, total when known
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Logical request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Multipart upload, sent as POST
    Multipart,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Multipart => "MULTIPART",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to upload in a multipart request
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a file from disk, naming the part after the file
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid_request(format!("Invalid file name: {}", path.display())))?;
        Ok(Self::new(filename, data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Unit of work for [`crate::http::RequestPipeline::execute`]
///
/// For [`HttpMethod::Multipart`] the body, when present, must be a JSON object;
/// each entry becomes a text field.
#[derive(Clone)]
pub struct RequestDescription {
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
    pub(crate) body: Option<Value>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) files: Vec<FileUpload>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) on_send_progress: Option<ProgressCallback>,
    pub(crate) on_receive_progress: Option<ProgressCallback>,
}

impl RequestDescription {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
            files: Vec::new(),
            cancellation: None,
            on_send_progress: None,
            on_receive_progress: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn multipart(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Multipart, path)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query parameter, replacing an earlier value for the same key
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    /// Add a header, replacing an earlier value for the same name (case-insensitive)
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name.into(), value.into());
        self
    }

    pub fn file(mut self, file: FileUpload) -> Self {
        self.files.push(file);
        self
    }

    pub fn files(mut self, files: impl IntoIterator<Item = FileUpload>) -> Self {
        self.files.extend(files);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn on_send_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_send_progress = Some(callback);
        self
    }

    pub fn on_receive_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_receive_progress = Some(callback);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Check the multipart/file invariants
    pub fn validate(&self) -> Result<()> {
        match self.method {
            HttpMethod::Multipart => {
                if self.files.is_empty() {
                    return Err(Error::invalid_request(
                        "multipart request requires at least one file",
                    ));
                }
                if let Some(body) = &self.body {
                    if !body.is_object() {
                        return Err(Error::invalid_request(
                            "multipart body must be a JSON object of fields",
                        ));
                    }
                }
            }
            method if !self.files.is_empty() => {
                return Err(Error::invalid_request(format!(
                    "{} request must not carry files",
                    method
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Debug for RequestDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescription")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &super::auth::redact_headers(&self.headers))
            .field("files", &self.files)
            .field("cancellable", &self.cancellation.is_some())
            .finish()
    }
}

/// Insert or replace a header, matching names case-insensitively
pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
        Some(entry) => *entry = (name, value),
        None => headers.push((name, value)),
    }
}
