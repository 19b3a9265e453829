//! `reqwest`-backed transport
//!
//! Connect and read timeouts are fixed on the underlying client when the
//! transport is built. Cancellation is checked before sending and raced
//! against the whole exchange, including chunked body transfer.

use async_trait::async_trait;
use futures::stream;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;
use url::Url;

use super::error::TransportFault;
use super::multipart::{MultipartPart, MultipartPayload};
use super::request::ProgressCallback;
use super::transport::{decode_body, RequestBody, Transport, TransportRequest, TransportResponse};
use crate::config::PipelineConfig;
use crate::{Error, Result};

/// Upload chunk size used when send progress is observed
const UPLOAD_CHUNK: usize = 16 * 1024;

const OCTET_STREAM: &str = "application/octet-stream";

/// Transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.receive_timeout)
            .build()
            .map_err(|e| Error::Transport {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, base_url })
    }

    /// Resolve `path` against the base URL; absolute URLs pass through
    fn resolve(&self, path: &str) -> std::result::Result<Url, TransportFault> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| TransportFault::Unknown(e.to_string()));
        }

        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| TransportFault::Unknown(e.to_string()))
    }

    async fn perform(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportFault> {
        let url = self.resolve(&request.path)?;
        let mut builder = self.client.request(request.method.as_method(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        // The multipart boundary must come from the form itself.
        let multipart = matches!(request.body, RequestBody::Multipart(_));
        let caller_content_type = request.header(CONTENT_TYPE.as_str()).is_some();
        for (name, value) in &request.headers {
            if multipart && name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        let uploading = !matches!(request.body, RequestBody::Empty);
        let mut json_length = None;
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| TransportFault::Unknown(e.to_string()))?;
                json_length = Some(bytes.len() as u64);
                if !caller_content_type {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                }
                builder.body(bytes)
            }
            RequestBody::Multipart(payload) => {
                builder.multipart(build_form(payload, request.on_send_progress.clone())?)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(e, uploading))?;

        // JSON bodies go out with a fixed length, so progress is reported once.
        if let (Some(total), Some(progress)) = (json_length, &request.on_send_progress) {
            progress(total, Some(total));
        }

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        let bytes = read_body(response, request.on_receive_progress).await?;
        let body = decode_body(&bytes);
        trace!(status, bytes = bytes.len(), "Response received");

        if !(200..300).contains(&status) {
            return Err(TransportFault::BadResponse { status, body });
        }

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportFault> {
        let cancellation = request.cancellation.clone();
        if cancellation.is_cancelled() {
            return Err(TransportFault::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(TransportFault::Cancelled),
            result = self.perform(request) => result,
        }
    }
}

/// File part body that reports progress as chunks are pulled by the connection.
///
/// `sent` is shared so several file parts add up to one total.
fn progress_body(
    bytes: Vec<u8>,
    progress: Option<ProgressCallback>,
    sent: Arc<AtomicU64>,
    total: u64,
) -> Body {
    let Some(progress) = progress else {
        return Body::from(bytes);
    };

    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
    let stream = stream::iter(chunks.into_iter().map(move |chunk| {
        let now = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        progress(now, Some(total));
        Ok::<_, std::io::Error>(chunk)
    }));
    Body::wrap_stream(stream)
}

fn build_form(
    payload: MultipartPayload,
    progress: Option<ProgressCallback>,
) -> std::result::Result<Form, TransportFault> {
    let total = payload.file_bytes();
    let sent = Arc::new(AtomicU64::new(0));
    let mut form = Form::new();

    for part in payload.into_parts() {
        match part {
            MultipartPart::Text { name, value } => {
                form = form.text(name, value);
            }
            MultipartPart::File { name, file } => {
                let length = file.data.len() as u64;
                let mime = file.content_type.unwrap_or_else(|| OCTET_STREAM.to_string());
                let body = progress_body(file.data, progress.clone(), sent.clone(), total);
                let part = Part::stream_with_length(body, length)
                    .file_name(file.filename)
                    .mime_str(&mime)
                    .map_err(|e| TransportFault::Unknown(format!("Invalid content type {:?}: {}", mime, e)))?;
                form = form.part(name, part);
            }
        }
    }

    Ok(form)
}

async fn read_body(
    mut response: reqwest::Response,
    progress: Option<ProgressCallback>,
) -> std::result::Result<Vec<u8>, TransportFault> {
    let total = response.content_length();
    let mut buffer = Vec::with_capacity(total.unwrap_or(0).min(1 << 20) as usize);

    while let Some(chunk) = response.chunk().await.map_err(map_receive_error)? {
        buffer.extend_from_slice(&chunk);
        if let Some(progress) = &progress {
            progress(buffer.len() as u64, total);
        }
    }

    Ok(buffer)
}

fn map_send_error(error: reqwest::Error, uploading: bool) -> TransportFault {
    if error.is_timeout() {
        if error.is_connect() {
            TransportFault::ConnectTimeout
        } else if uploading && error.is_body() {
            TransportFault::SendTimeout
        } else {
            TransportFault::ReceiveTimeout
        }
    } else if error.is_connect() || error.is_request() || error.is_body() {
        TransportFault::Connection(error.to_string())
    } else {
        TransportFault::Unknown(error.to_string())
    }
}

fn map_receive_error(error: reqwest::Error) -> TransportFault {
    if error.is_timeout() {
        TransportFault::ReceiveTimeout
    } else if error.is_body() || error.is_decode() || error.is_request() {
        TransportFault::Connection(error.to_string())
    } else {
        TransportFault::Unknown(error.to_string())
    }
}
