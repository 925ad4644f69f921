//! Session configuration.

use serde::{Deserialize, Serialize};

/// Token lifetime handling and durable slot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Refresh this many seconds before the advertised expiry to absorb
    /// clock skew between client and server.
    #[serde(default = "default_refresh_skew")]
    pub refresh_skew_seconds: u64,
    /// Whether the token pair is written to the durable slot.
    #[serde(default = "default_true")]
    pub persist: bool,
    /// Path of the durable token slot (JSON file).
    #[serde(default = "default_token_file")]
    pub token_file: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_skew_seconds: default_refresh_skew(),
            persist: default_true(),
            token_file: default_token_file(),
        }
    }
}

fn default_refresh_skew() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_token_file() -> String {
    "data/session/token.json".to_string()
}
