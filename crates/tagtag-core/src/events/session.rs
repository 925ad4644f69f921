//! Session lifecycle events.

use serde::{Deserialize, Serialize};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequested,
    /// The refresh token was rejected.
    RefreshExpired,
    /// The controller was torn down.
    Teardown,
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequested => write!(f, "user_requested"),
            Self::RefreshExpired => write!(f, "refresh_expired"),
            Self::Teardown => write!(f, "teardown"),
        }
    }
}

/// Events related to the client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Login completed and the session context was built.
    LoggedIn {
        /// The user ID.
        user_id: i64,
        /// The login name.
        username: String,
    },
    /// A persisted token was rehydrated and the context rebuilt.
    Restored {
        /// The user ID.
        user_id: i64,
    },
    /// The access token was replaced by a refresh.
    TokenRefreshed,
    /// Access codes and menus were fetched again.
    PermissionsReloaded {
        /// Number of access codes.
        access_codes: usize,
        /// Number of menu records.
        menus: usize,
    },
    /// The session ended by user request or teardown.
    LoggedOut {
        /// Why the session ended.
        reason: LogoutReason,
    },
    /// The session was ended because it could not be refreshed.
    ForcedLogout {
        /// Why the session ended.
        reason: LogoutReason,
    },
}
