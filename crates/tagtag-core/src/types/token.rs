//! Access/refresh token pair as issued by the identity endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Token pair returned by login and refresh.
///
/// Token contents are opaque; nothing here inspects them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Bearer token attached to protected calls.
    pub access_token: String,
    /// Token exchanged for a new pair once the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token type, usually `Bearer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenPair {
    /// Creates a pair holding only an access token.
    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: Some("Bearer".to_string()),
            expires_in: None,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        let scheme = self.token_type.as_deref().unwrap_or("Bearer");
        format!("{scheme} {}", self.access_token)
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A token pair together with the instant it was obtained.
///
/// This is the shape written to the durable slot, so the absolute expiry
/// survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    /// The token pair.
    #[serde(flatten)]
    pub pair: TokenPair,
    /// When the pair was received.
    pub obtained_at: DateTime<Utc>,
}

impl StoredToken {
    /// Wraps a freshly received pair.
    pub fn new(pair: TokenPair) -> Self {
        Self {
            pair,
            obtained_at: Utc::now(),
        }
    }

    /// Absolute access token expiry, when the server advertised a lifetime.
    ///
    /// A lifetime too large to represent is treated like a missing one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.pair.expires_in?;
        let expires_at = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime));

        if expires_at.is_none() {
            warn!(expires_in = secs, "Token lifetime out of range, treating as non-expiring");
        }
        expires_at
    }

    /// Whether the access token expires within `skew` of `now`.
    ///
    /// Tokens without an advertised lifetime never count as expiring; the
    /// server's rejection is the only signal for those.
    pub fn is_expiring_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        match self.expires_at() {
            Some(expires_at) => now + skew >= expires_at,
            None => false,
        }
    }
}
