//! Access credentials and the collaborators that persist and renew them
//!
//! A [`Credential`] is an immutable value. The pipeline never mutates one in
//! place; a refreshed or newly issued credential replaces the stored value
//! through a [`CredentialStore`].

pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

pub use store::{FileCredentialStore, MemoryCredentialStore};

/// Access token plus optional refresh token and expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create a credential holding only an access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Attach a refresh token
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set an absolute expiry
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set a relative expiry, resolved against the current time.
    ///
    /// Lifetimes beyond the representable range saturate to the earliest or
    /// latest instant.
    pub fn with_expires_in(self, lifetime: Duration) -> Self {
        let expires_at = Utc::now().checked_add_signed(lifetime).unwrap_or(
            if lifetime < Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            },
        );
        self.with_expires_at(expires_at)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the credential is known to be expired at `now`.
    ///
    /// A credential without expiry metadata is never considered expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Tokens never reach logs through Debug.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Persistence for the current credential.
///
/// Implementations own their own synchronisation: the pipeline may call these
/// methods from any number of concurrent requests. A persisted value that
/// cannot be decoded must read as `None`, and the store should clear it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether a credential is currently stored
    async fn is_stored(&self) -> Result<bool> {
        Ok(self.read().await?.is_some())
    }

    /// Replace the stored credential
    async fn save(&self, credential: Credential) -> Result<()>;

    /// Read the stored credential, if any
    async fn read(&self) -> Result<Option<Credential>>;

    /// Remove the stored credential
    async fn clear(&self) -> Result<()>;
}

/// Exchanges an expired credential for a fresh one
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    async fn refresh(&self, current: &Credential) -> Result<Credential>;
}
