//! Request pipeline orchestrating authentication, dispatch and classification
//!
//! One `execute` call maps to exactly one transport call. The pipeline keeps
//! no per-request state, so it can be shared (`Arc<RequestPipeline>`) and
//! called concurrently. Credential consistency under concurrent invalidation
//! is the store's concern.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::auth::{redact_headers, Authenticator, AUTHORIZATION};
use super::endpoint::PublicEndpoints;
use super::envelope::ResponseEnvelope;
use super::error::{classify, ErrorCategory, Failure, TransportFault};
use super::multipart::MultipartBuilder;
use super::request::{set_header, FileUpload, HttpMethod, RequestDescription};
use super::reqwest_transport::ReqwestTransport;
use super::transport::{RequestBody, Transport, TransportMethod, TransportRequest, TransportResponse};
use crate::config::PipelineConfig;
use crate::credential::{CredentialRefresher, CredentialStore};
use crate::Result;

/// Authenticated request pipeline
pub struct RequestPipeline {
    config: PipelineConfig,
    endpoints: PublicEndpoints,
    multipart: MultipartBuilder,
    authenticator: Authenticator,
    transport: Arc<dyn Transport>,
}

impl RequestPipeline {
    /// Create a pipeline backed by [`ReqwestTransport`]
    pub fn new(config: PipelineConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Self::with_transport(config, store, transport)
    }

    /// Create a pipeline over a caller-supplied transport
    pub fn with_transport(
        config: PipelineConfig,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            endpoints: PublicEndpoints::new(config.public_endpoints.iter().cloned()),
            multipart: MultipartBuilder::new(config.file_field_name.clone()),
            authenticator: Authenticator::new(store),
            transport,
            config,
        })
    }

    /// Renew expired credentials through `refresher` before attaching them
    pub fn with_refresher(mut self, refresher: Arc<dyn CredentialRefresher>) -> Self {
        self.authenticator = self.authenticator.with_refresher(refresher);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Whether `path` is served without a credential
    pub fn is_public(&self, path: &str) -> bool {
        self.endpoints.is_public(path)
    }

    /// Execute a request and decode a successful body into `T`.
    ///
    /// Never fails: every outcome, including invalid descriptions and decode
    /// errors, is reported through the envelope.
    #[instrument(
        name = "execute",
        skip(self, request),
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn execute<T>(&self, request: RequestDescription) -> ResponseEnvelope<T>
    where
        T: DeserializeOwned,
    {
        let started = Instant::now();

        if let Err(e) = request.validate() {
            warn!(error = %e, "Rejected request description");
            return ResponseEnvelope::failure(Failure::unknown(e.to_string(), None));
        }

        let public = self.is_public(&request.path);
        let path = request.path.clone();
        let transport_request = self.prepare(request, public).await;

        if self.config.verbose_logging {
            debug!(
                headers = ?redact_headers(&transport_request.headers),
                query = ?transport_request.query,
                body = ?transport_request.body,
                public,
                "Dispatching request"
            );
        }

        let cancellation = transport_request.cancellation.clone();
        let outcome = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(TransportFault::Cancelled),
            result = self.transport.send(transport_request) => result,
        };

        let envelope = match outcome.and_then(ensure_success) {
            Ok(response) => self.on_success(response),
            Err(fault) => self.on_failure(&fault, &path, public).await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match envelope.error_type() {
            None => info!(status = ?envelope.status_code(), elapsed_ms, "Request completed"),
            Some(category) => warn!(
                status = ?envelope.status_code(),
                category = %category,
                elapsed_ms,
                "Request failed"
            ),
        }

        envelope
    }

    pub async fn get<T: DeserializeOwned>(&self, path: impl Into<String>) -> ResponseEnvelope<T> {
        self.execute(RequestDescription::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: Value,
    ) -> ResponseEnvelope<T> {
        self.execute(RequestDescription::post(path).body(body)).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: Value,
    ) -> ResponseEnvelope<T> {
        self.execute(RequestDescription::put(path).body(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        body: Value,
    ) -> ResponseEnvelope<T> {
        self.execute(RequestDescription::patch(path).body(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: impl Into<String>) -> ResponseEnvelope<T> {
        self.execute(RequestDescription::delete(path)).await
    }

    pub async fn multipart<T: DeserializeOwned>(
        &self,
        path: impl Into<String>,
        fields: Map<String, Value>,
        files: Vec<FileUpload>,
    ) -> ResponseEnvelope<T> {
        self.execute(
            RequestDescription::multipart(path)
                .body(Value::Object(fields))
                .files(files),
        )
        .await
    }

    /// Pre-flight and payload preparation
    async fn prepare(&self, request: RequestDescription, public: bool) -> TransportRequest {
        let RequestDescription {
            method,
            path,
            body,
            query,
            mut headers,
            files,
            cancellation,
            on_send_progress,
            on_receive_progress,
        } = request;

        if !public {
            if let Some(bearer) = self.authenticator.authorization().await {
                set_header(&mut headers, AUTHORIZATION.to_string(), bearer);
            }
        }

        let (method, body) = match method {
            HttpMethod::Get => (TransportMethod::Get, json_body(body)),
            HttpMethod::Post => (TransportMethod::Post, json_body(body)),
            HttpMethod::Put => (TransportMethod::Put, json_body(body)),
            HttpMethod::Patch => (TransportMethod::Patch, json_body(body)),
            HttpMethod::Delete => (TransportMethod::Delete, json_body(body)),
            HttpMethod::Multipart => {
                let fields = match body {
                    Some(Value::Object(fields)) => fields,
                    _ => Map::new(),
                };
                let payload = self.multipart.build(&fields, &files);
                (TransportMethod::Post, RequestBody::Multipart(payload))
            }
        };

        TransportRequest {
            method,
            path,
            query,
            headers,
            body,
            cancellation: cancellation.unwrap_or_default(),
            on_send_progress,
            on_receive_progress,
        }
    }

    fn on_success<T: DeserializeOwned>(&self, response: TransportResponse) -> ResponseEnvelope<T> {
        if self.config.verbose_logging {
            debug!(status = response.status, body = ?response.body, "Response body");
        }

        let data = match response.body {
            None => None,
            Some(body) => match serde_json::from_value::<T>(body) {
                Ok(data) => Some(data),
                Err(e) => {
                    return ResponseEnvelope::failure(Failure::unknown(
                        format!("Failed to decode response body: {}", e),
                        Some(response.status),
                    ))
                }
            },
        };

        ResponseEnvelope::success(data, response.status)
    }

    async fn on_failure<T>(&self, fault: &TransportFault, path: &str, public: bool) -> ResponseEnvelope<T> {
        let failure = classify(fault, path);

        if self.config.verbose_logging {
            if let TransportFault::BadResponse { body, .. } = fault {
                debug!(body = ?body, "Error response body");
            }
        }

        // Completes before the envelope is returned so later calls see the cleared store.
        if failure.category == ErrorCategory::Unauthorized && !public {
            self.authenticator.invalidate().await;
        }

        ResponseEnvelope::failure(failure)
    }
}

fn json_body(body: Option<Value>) -> RequestBody {
    body.map(RequestBody::Json).unwrap_or(RequestBody::Empty)
}

/// Treat non-2xx responses from lenient transports as faults
fn ensure_success(response: TransportResponse) -> std::result::Result<TransportResponse, TransportFault> {
    if (200..300).contains(&response.status) {
        Ok(response)
    } else {
        Err(TransportFault::BadResponse {
            status: response.status,
            body: response.body,
        })
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("config", &self.config)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Credential, MemoryCredentialStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Transport returning a fixed outcome and recording what it saw
    struct StubTransport {
        outcome: std::result::Result<TransportResponse, TransportFault>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl StubTransport {
        fn new(outcome: std::result::Result<TransportResponse, TransportFault>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> TransportRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> std::result::Result<TransportResponse, TransportFault> {
            self.seen.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig::new("https://api.example.com").with_public_endpoints(["/auth/login"])
    }

    fn pipeline(transport: Arc<StubTransport>) -> RequestPipeline {
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new("abc")));
        RequestPipeline::with_transport(config(), store, transport).unwrap()
    }

    #[tokio::test]
    async fn test_method_dispatch_table() {
        let transport = StubTransport::new(Ok(TransportResponse::new(200, None)));
        let pipeline = pipeline(transport.clone());

        let cases = [
            (RequestDescription::get("/a"), TransportMethod::Get),
            (RequestDescription::post("/a"), TransportMethod::Post),
            (RequestDescription::put("/a"), TransportMethod::Put),
            (RequestDescription::patch("/a"), TransportMethod::Patch),
            (RequestDescription::delete("/a"), TransportMethod::Delete),
            (
                RequestDescription::multipart("/a").file(FileUpload::new("f.txt", vec![1])),
                TransportMethod::Post,
            ),
        ];

        for (request, expected) in cases {
            let envelope: ResponseEnvelope<Value> = pipeline.execute(request).await;
            assert!(envelope.is_success());
            assert_eq!(transport.last().method, expected);
        }
    }

    #[tokio::test]
    async fn test_body_passes_through_unchanged() {
        let transport = StubTransport::new(Ok(TransportResponse::new(201, Some(json!({"id": 7})))));
        let pipeline = pipeline(transport.clone());

        let envelope: ResponseEnvelope<Value> =
            pipeline.post("/orders", json!({"qty": 2, "sku": "A-1"})).await;

        assert_eq!(envelope.message(), Some("resource created successfully"));
        assert_eq!(transport.last().body, RequestBody::Json(json!({"qty": 2, "sku": "A-1"})));
    }

    #[tokio::test]
    async fn test_multipart_fields_and_files() {
        let transport = StubTransport::new(Ok(TransportResponse::new(200, None)));
        let pipeline = pipeline(transport.clone());

        let fields = json!({"album": "summer"}).as_object().cloned().unwrap();
        let _: ResponseEnvelope<Value> = pipeline
            .multipart(
                "/photos",
                fields,
                vec![FileUpload::new("a.jpg", vec![1]), FileUpload::new("b.jpg", vec![2])],
            )
            .await;

        match transport.last().body {
            RequestBody::Multipart(payload) => {
                assert_eq!(payload.text_parts().count(), 1);
                assert_eq!(payload.file_parts().count(), 2);
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_description_never_dispatched() {
        let transport = StubTransport::new(Ok(TransportResponse::new(200, None)));
        let pipeline = pipeline(transport.clone());

        let envelope: ResponseEnvelope<Value> =
            pipeline.execute(RequestDescription::multipart("/upload")).await;

        assert!(!envelope.is_success());
        assert_eq!(envelope.error_type(), Some(ErrorCategory::Unknown));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decode_failure_is_unknown_with_status() {
        let transport = StubTransport::new(Ok(TransportResponse::new(200, Some(json!("text")))));
        let pipeline = pipeline(transport);

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            id: u64,
        }

        let envelope: ResponseEnvelope<User> = pipeline.get("/users/1").await;
        assert!(!envelope.is_success());
        assert_eq!(envelope.error_type(), Some(ErrorCategory::Unknown));
        assert_eq!(envelope.status_code(), Some(200));
    }

    #[tokio::test]
    async fn test_lenient_transport_non_2xx_is_classified() {
        let transport = StubTransport::new(Ok(TransportResponse::new(503, None)));
        let pipeline = pipeline(transport);

        let envelope: ResponseEnvelope<Value> = pipeline.get("/status").await;
        assert_eq!(envelope.error_type(), Some(ErrorCategory::Server));
        assert_eq!(envelope.status_code(), Some(503));
    }

    #[tokio::test]
    async fn test_empty_body_yields_no_data() {
        let transport = StubTransport::new(Ok(TransportResponse::new(204, None)));
        let pipeline = pipeline(transport);

        let envelope: ResponseEnvelope<Value> = pipeline.delete("/users/1").await;
        assert!(envelope.is_success());
        assert!(envelope.data().is_none());
        assert_eq!(envelope.message(), Some("request completed successfully"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let transport = StubTransport::new(Ok(TransportResponse::new(200, None)));
        let store = Arc::new(MemoryCredentialStore::new());
        let result = RequestPipeline::with_transport(PipelineConfig::default(), store, transport);
        assert!(result.is_err());
    }
}
