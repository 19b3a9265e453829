//! Error taxonomy and transport-fault classification
//!
//! Every failed request is reduced to one [`ErrorCategory`] plus a fixed,
//! human-readable message. Classification is a pure function of the fault
//! and the request path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Closed set of failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Connectivity, DNS or socket-level fault
    Network,
    /// Connect, send or receive timeout exceeded
    Timeout,
    /// Cancellation token triggered
    Cancelled,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 422, or 400 carrying validation errors
    Validation,
    /// HTTP 5xx
    Server,
    /// Any other 4xx
    Api,
    /// Everything else
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "NETWORK",
            ErrorCategory::Timeout => "TIMEOUT",
            ErrorCategory::Cancelled => "CANCELLED",
            ErrorCategory::Unauthorized => "UNAUTHORIZED",
            ErrorCategory::Forbidden => "FORBIDDEN",
            ErrorCategory::NotFound => "NOT_FOUND",
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::Server => "SERVER",
            ErrorCategory::Api => "API",
            ErrorCategory::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fault raised by a transport
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportFault {
    #[error("connect timeout")]
    ConnectTimeout,

    #[error("send timeout")]
    SendTimeout,

    #[error("receive timeout")]
    ReceiveTimeout,

    #[error("request cancelled")]
    Cancelled,

    /// No response was received
    #[error("connection error: {0}")]
    Connection(String),

    /// A response arrived with a non-success status
    #[error("bad response: HTTP {status}")]
    BadResponse { status: u16, body: Option<Value> },

    #[error("unknown transport fault: {0}")]
    Unknown(String),
}

/// Outcome of classifying a failed request
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
    pub status_code: Option<u16>,
    /// Raw server body, only when it is a JSON object
    pub details: Option<Map<String, Value>>,
}

impl Failure {
    /// Failure raised before or after the transport call, outside its taxonomy
    pub fn unknown(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            category: ErrorCategory::Unknown,
            message: message.into(),
            status_code,
            details: None,
        }
    }
}

const MSG_CANCELLED: &str = "Request was cancelled";
const MSG_CONNECT_TIMEOUT: &str = "Connection to the server timed out";
const MSG_SEND_TIMEOUT: &str = "Sending the request timed out";
const MSG_RECEIVE_TIMEOUT: &str = "Waiting for the server response timed out";
const MSG_NETWORK: &str = "Unable to reach the server, check your network connection";
const MSG_UNAUTHORIZED: &str = "Authentication required, please sign in again";
const MSG_FORBIDDEN: &str = "You do not have permission to perform this action";
const MSG_VALIDATION: &str = "The submitted data is invalid";
const MSG_SERVER: &str = "The server encountered an error, please try again later";
const MSG_UNKNOWN: &str = "An unexpected error occurred";

/// Classify a transport fault for a request to `path`.
///
/// Priority: cancellation, timeout, connectivity, then the response status.
pub fn classify(fault: &TransportFault, path: &str) -> Failure {
    match fault {
        TransportFault::Cancelled => simple(ErrorCategory::Cancelled, MSG_CANCELLED),
        TransportFault::ConnectTimeout => simple(ErrorCategory::Timeout, MSG_CONNECT_TIMEOUT),
        TransportFault::SendTimeout => simple(ErrorCategory::Timeout, MSG_SEND_TIMEOUT),
        TransportFault::ReceiveTimeout => simple(ErrorCategory::Timeout, MSG_RECEIVE_TIMEOUT),
        TransportFault::Connection(_) => simple(ErrorCategory::Network, MSG_NETWORK),
        TransportFault::BadResponse { status, body } => classify_response(*status, body.as_ref(), path),
        TransportFault::Unknown(_) => simple(ErrorCategory::Unknown, MSG_UNKNOWN),
    }
}

fn simple(category: ErrorCategory, message: &str) -> Failure {
    Failure {
        category,
        message: message.to_string(),
        status_code: None,
        details: None,
    }
}

fn classify_response(status: u16, body: Option<&Value>, path: &str) -> Failure {
    let category = classify_status(status, body);

    let message = match category {
        ErrorCategory::Unauthorized => MSG_UNAUTHORIZED.to_string(),
        ErrorCategory::Forbidden => MSG_FORBIDDEN.to_string(),
        ErrorCategory::NotFound => format!("The requested resource was not found: {}", path),
        ErrorCategory::Validation => {
            server_message(body).unwrap_or_else(|| MSG_VALIDATION.to_string())
        }
        ErrorCategory::Server => MSG_SERVER.to_string(),
        ErrorCategory::Api => server_message(body)
            .unwrap_or_else(|| format!("Request failed with status {}", status)),
        _ => MSG_UNKNOWN.to_string(),
    };

    Failure {
        category,
        message,
        status_code: Some(status),
        details: body.and_then(Value::as_object).cloned(),
    }
}

/// Map a response status to its category
fn classify_status(status: u16, body: Option<&Value>) -> ErrorCategory {
    match status {
        401 => ErrorCategory::Unauthorized,
        403 => ErrorCategory::Forbidden,
        404 => ErrorCategory::NotFound,
        422 => ErrorCategory::Validation,
        400 if has_validation_errors(body) => ErrorCategory::Validation,
        400..=499 => ErrorCategory::Api,
        500..=599 => ErrorCategory::Server,
        _ => ErrorCategory::Unknown,
    }
}

fn has_validation_errors(body: Option<&Value>) -> bool {
    matches!(
        body.and_then(|b| b.get("errors")),
        Some(Value::Object(_)) | Some(Value::Array(_))
    )
}

/// Extract a server-supplied message (`message`, then `error.message`)
fn server_message(body: Option<&Value>) -> Option<String> {
    let body = body?;
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn bad(status: u16, body: Option<Value>) -> TransportFault {
        TransportFault::BadResponse { status, body }
    }

    #[test]
    fn test_transport_level_faults() {
        assert_eq!(classify(&TransportFault::Cancelled, "/x").category, ErrorCategory::Cancelled);
        assert_eq!(classify(&TransportFault::ConnectTimeout, "/x").category, ErrorCategory::Timeout);
        assert_eq!(classify(&TransportFault::SendTimeout, "/x").category, ErrorCategory::Timeout);
        assert_eq!(classify(&TransportFault::ReceiveTimeout, "/x").category, ErrorCategory::Timeout);
        assert_eq!(
            classify(&TransportFault::Connection("refused".into()), "/x").category,
            ErrorCategory::Network
        );
        assert_eq!(
            classify(&TransportFault::Unknown("boom".into()), "/x").category,
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_transport_level_faults_have_no_status() {
        let failure = classify(&TransportFault::ReceiveTimeout, "/reports");
        assert_eq!(failure.status_code, None);
        assert!(failure.details.is_none());
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, ErrorCategory::Unauthorized),
            (403, ErrorCategory::Forbidden),
            (404, ErrorCategory::NotFound),
            (422, ErrorCategory::Validation),
            (400, ErrorCategory::Api),
            (409, ErrorCategory::Api),
            (429, ErrorCategory::Api),
            (500, ErrorCategory::Server),
            (503, ErrorCategory::Server),
            (302, ErrorCategory::Unknown),
            (600, ErrorCategory::Unknown),
        ];
        for (status, expected) in cases {
            let failure = classify(&bad(status, None), "/x");
            assert_eq!(failure.category, expected, "status {}", status);
            assert_eq!(failure.status_code, Some(status));
        }
    }

    #[test]
    fn test_bad_request_with_validation_errors() {
        let body = json!({"message": "invalid", "errors": {"qty": ["must be positive"]}});
        let failure = classify(&bad(400, Some(body)), "/orders");
        assert_eq!(failure.category, ErrorCategory::Validation);
        assert_eq!(failure.message, "invalid");

        let body = json!({"errors": "not structured"});
        assert_eq!(classify(&bad(400, Some(body)), "/orders").category, ErrorCategory::Api);
    }

    #[test]
    fn test_unprocessable_uses_server_message() {
        let failure = classify(&bad(422, Some(json!({"message": "invalid qty"}))), "/orders");
        assert_eq!(failure.category, ErrorCategory::Validation);
        assert_eq!(failure.message, "invalid qty");
        assert_eq!(failure.status_code, Some(422));
        assert_eq!(failure.details.unwrap()["message"], "invalid qty");
    }

    #[test]
    fn test_api_message_fallbacks() {
        let nested = json!({"error": {"message": "quota exceeded"}});
        assert_eq!(classify(&bad(429, Some(nested)), "/x").message, "quota exceeded");

        let failure = classify(&bad(409, None), "/x");
        assert_eq!(failure.message, "Request failed with status 409");
    }

    #[test]
    fn test_not_found_interpolates_path() {
        let failure = classify(&bad(404, None), "/users/42");
        assert_eq!(failure.message, "The requested resource was not found: /users/42");
    }

    #[test]
    fn test_details_only_for_json_objects() {
        let failure = classify(&bad(500, Some(json!(["a", "b"]))), "/x");
        assert!(failure.details.is_none());

        let failure = classify(&bad(500, Some(json!("plain text"))), "/x");
        assert!(failure.details.is_none());

        let failure = classify(&bad(500, Some(json!({"trace": "abc"}))), "/x");
        assert_eq!(failure.details.unwrap()["trace"], "abc");
    }

    #[test]
    fn test_category_serialisation() {
        assert_eq!(serde_json::to_value(ErrorCategory::NotFound).unwrap(), json!("NOT_FOUND"));
        assert_eq!(ErrorCategory::Unauthorized.to_string(), "UNAUTHORIZED");
    }

    fn any_fault() -> impl Strategy<Value = TransportFault> {
        prop_oneof![
            Just(TransportFault::Cancelled),
            Just(TransportFault::ConnectTimeout),
            Just(TransportFault::SendTimeout),
            Just(TransportFault::ReceiveTimeout),
            "[a-z ]{0,20}".prop_map(TransportFault::Connection),
            "[a-z ]{0,20}".prop_map(TransportFault::Unknown),
            (100u16..700, proptest::option::of("[a-z ]{0,20}")).prop_map(|(status, msg)| {
                TransportFault::BadResponse {
                    status,
                    body: msg.map(|m| json!({ "message": m })),
                }
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_classification_is_deterministic(fault in any_fault(), path in "/[a-z0-9/]{0,20}") {
            let first = classify(&fault, &path);
            let second = classify(&fault, &path);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_5xx_is_always_server(status in 500u16..600) {
            prop_assert_eq!(classify(&bad(status, None), "/x").category, ErrorCategory::Server);
        }
    }
}
