//! Pipeline configuration
//!
//! Values are fixed at construction. Timeouts are enforced by the transport,
//! never per request.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::http::multipart::DEFAULT_FILE_FIELD;
use crate::{Error, Result};

/// Default connect and receive timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Construction parameters for [`crate::http::RequestPipeline`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base URL every request path is resolved against
    pub base_url: String,

    #[serde(rename = "connect_timeout_secs", with = "duration_secs")]
    pub connect_timeout: Duration,

    #[serde(rename = "receive_timeout_secs", with = "duration_secs")]
    pub receive_timeout: Duration,

    /// Path fragments that need no credential
    pub public_endpoints: Vec<String>,

    /// Log request and response bodies at debug level
    pub verbose_logging: bool,

    /// Field name shared by all multipart file parts
    pub file_field_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout: DEFAULT_TIMEOUT,
            receive_timeout: DEFAULT_TIMEOUT,
            public_endpoints: Vec::new(),
            verbose_logging: true,
            file_field_name: DEFAULT_FILE_FIELD.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn with_public_endpoints<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_endpoints = fragments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub fn with_file_field_name(mut self, name: impl Into<String>) -> Self {
        self.file_field_name = name.into();
        self
    }

    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| Error::Configuration {
            message: format!("Invalid base URL: {:?}", self.base_url),
            source: Some(e.into()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::configuration("base_url must not be empty"));
        }

        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "base_url must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.connect_timeout.is_zero() {
            return Err(Error::configuration("Connect timeout cannot be zero"));
        }

        if self.receive_timeout.is_zero() {
            return Err(Error::configuration("Receive timeout cannot be zero"));
        }

        // An empty fragment would make every path public.
        if self.public_endpoints.iter().any(|f| f.is_empty()) {
            return Err(Error::configuration("Public endpoint fragments must not be empty"));
        }

        if self.file_field_name.is_empty() {
            return Err(Error::configuration("file_field_name must not be empty"));
        }

        Ok(())
    }

    /// Apply `COURIER_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("COURIER_BASE_URL") {
            self.base_url = base_url;
        }

        if let Some(value) = lookup("COURIER_CONNECT_TIMEOUT") {
            self.connect_timeout = parse_secs("COURIER_CONNECT_TIMEOUT", &value)?;
        }

        if let Some(value) = lookup("COURIER_RECEIVE_TIMEOUT") {
            self.receive_timeout = parse_secs("COURIER_RECEIVE_TIMEOUT", &value)?;
        }

        if let Some(value) = lookup("COURIER_PUBLIC_ENDPOINTS") {
            self.public_endpoints = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = lookup("COURIER_VERBOSE") {
            self.verbose_logging = value.eq_ignore_ascii_case("true") || value == "1";
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| Error::configuration(format!("{} must be a number of seconds, got {:?}", key, value)))
}

/// Serde adapter: durations as (fractional) seconds
mod duration_secs {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid timeout {}: {}", secs, e)))
    }
}
