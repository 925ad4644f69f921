//! The authenticated identity and its profile.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::menu::lenient_id;

/// Role assigned when the profile carries none.
pub const DEFAULT_ROLE: &str = "user";

/// Profile fields returned by `GET /auth/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// User ID.
    #[serde(default, deserialize_with = "lenient_id::required")]
    pub id: i64,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Display nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Gender (0 unknown, 1 male, 2 female).
    #[serde(default)]
    pub gender: Option<i32>,
    /// Birthday, `YYYY-MM-DD`.
    #[serde(default)]
    pub birthday: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Role codes, when the server includes them.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// The authenticated principal with its resolved authorization data.
///
/// Always rebuilt as a whole from a fresh profile and code list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// User ID.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Role codes.
    pub roles: BTreeSet<String>,
    /// Permission codes granted to this principal.
    pub access_codes: BTreeSet<String>,
    /// Raw profile detail.
    pub profile: Profile,
}

impl Principal {
    /// Builds a principal from a profile and the access codes fetched with it.
    pub fn from_profile(profile: Profile, access_codes: impl IntoIterator<Item = String>) -> Self {
        let display_name = profile
            .nickname
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&profile.username)
            .to_string();

        let roles: BTreeSet<String> = match &profile.roles {
            Some(roles) if !roles.is_empty() => roles.iter().cloned().collect(),
            _ => BTreeSet::from([DEFAULT_ROLE.to_string()]),
        };

        Self {
            id: profile.id,
            username: profile.username.clone(),
            display_name,
            roles,
            access_codes: access_codes.into_iter().collect(),
            profile,
        }
    }

    /// Whether the principal holds the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
