//! Uniform response envelope returned by every pipeline call

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{ErrorCategory, Failure};

/// Success or failure result of one request.
///
/// Fields are private so the success/failure split can only be built through
/// [`ResponseEnvelope::success`] and [`ResponseEnvelope::failure`]: a payload
/// never coexists with an error category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Map<String, Value>>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(data: Option<T>, status_code: u16) -> Self {
        Self {
            success: true,
            data,
            message: Some(success_message(status_code).to_string()),
            status_code: Some(status_code),
            error_type: None,
            details: None,
        }
    }

    pub fn failure(failure: Failure) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(failure.message),
            status_code: failure.status_code,
            error_type: Some(failure.category),
            details: failure.details,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn error_type(&self) -> Option<ErrorCategory> {
        self.error_type
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }
}

/// Advisory message for a 2xx status
pub fn success_message(status: u16) -> &'static str {
    match status {
        200 | 204 => "request completed successfully",
        201 => "resource created successfully",
        202 => "request accepted",
        _ => "operation successful",
    }
}
