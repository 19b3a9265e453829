//! Credential attachment for private endpoints
//!
//! The authenticator never fails a request: a missing, unreadable or expired
//! credential simply means no `Authorization` header, and the server's
//! rejection flows through the regular error classification.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::credential::{CredentialRefresher, CredentialStore};

pub const AUTHORIZATION: &str = "Authorization";

/// Resolves the `Authorization` header value for private requests
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    refresher: Option<Arc<dyn CredentialRefresher>>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            refresher: None,
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn CredentialRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Bearer header value for the current credential, if one is usable.
    ///
    /// An expired credential is exchanged once through the refresher when it
    /// carries a refresh token; the replacement is saved before use.
    pub async fn authorization(&self) -> Option<String> {
        let credential = match self.store.read().await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                debug!("No stored credential");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read credential, sending request without it");
                return None;
            }
        };

        if !credential.is_expired() {
            return Some(credential.bearer());
        }

        let refresher = match (&self.refresher, credential.refresh_token()) {
            (Some(refresher), Some(_)) => refresher,
            _ => {
                debug!("Stored credential is expired and cannot be refreshed");
                return None;
            }
        };

        match refresher.refresh(&credential).await {
            Ok(renewed) => {
                if let Err(e) = self.store.save(renewed.clone()).await {
                    warn!(error = %e, "Failed to persist refreshed credential");
                }
                debug!("Credential refreshed");
                Some(renewed.bearer())
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed");
                None
            }
        }
    }

    /// Remove the stored credential after the server rejected it.
    ///
    /// A failure here is logged and otherwise ignored.
    pub async fn invalidate(&self) {
        match self.store.clear().await {
            Ok(()) => debug!("Credential cleared after authentication failure"),
            Err(e) => warn!(error = %e, "Failed to clear credential"),
        }
    }
}

/// Copy of `headers` safe for logging
pub fn redact_headers(headers: &[(String, String)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case(AUTHORIZATION) {
                let scheme = value.split_whitespace().next().unwrap_or("");
                let redacted = if scheme.is_empty() || scheme == value {
                    "***".to_string()
                } else {
                    format!("{} ***", scheme)
                };
                (name.clone(), redacted)
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}
