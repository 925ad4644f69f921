//! Session state machine.

use serde::{Deserialize, Serialize};

/// Where the session is in its lifecycle.
///
/// ```text
/// Anonymous -> Authenticating -> Authenticated <-> RefreshingSilently
///     ^              |                 |                  |
///     +--------------+-----------------+------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session.
    Anonymous,
    /// Login or restore in progress.
    Authenticating,
    /// Principal, menus, and access codes are loaded.
    Authenticated,
    /// Authenticated, with a token refresh in flight.
    RefreshingSilently,
}

impl SessionState {
    /// Whether a usable session exists.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated | Self::RefreshingSilently)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::RefreshingSilently => write!(f, "refreshing"),
        }
    }
}
