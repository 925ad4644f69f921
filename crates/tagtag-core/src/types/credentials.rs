//! Login and registration inputs.

use serde::{Deserialize, Serialize};

/// Username/password pair with an optional captcha token.
///
/// Ephemeral: never written to the token slot or to logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Token obtained from a passed captcha challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

impl Credentials {
    /// Creates credentials without a captcha token.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            captcha_token: None,
        }
    }

    /// Attaches a captcha token.
    pub fn with_captcha(mut self, captcha_token: impl Into<String>) -> Self {
        self.captcha_token = Some(captcha_token.into());
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("captcha_token", &self.captcha_token.as_ref().map(|_| "<present>"))
            .finish()
    }
}

/// Self-service account registration.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired account name.
    pub username: String,
    /// Desired password.
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
