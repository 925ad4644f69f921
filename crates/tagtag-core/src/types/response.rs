//! Response envelope used by the identity service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code the service uses to mark success inside the envelope.
pub const ENVELOPE_SUCCESS: u16 = 200;

/// Standard `{code, message, data}` wrapper around response bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope {
    /// Business status code; `200` on success.
    pub code: u16,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload.
    #[serde(default)]
    pub data: Value,
    /// Field-level validation errors.
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl ApiEnvelope {
    /// Recognizes an envelope in a decoded body.
    ///
    /// Bodies that are not objects with a numeric `code` plus `data` or
    /// `message` are not envelopes; callers use them as the payload directly.
    pub fn detect(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        if !object.get("code").is_some_and(Value::is_u64) {
            return None;
        }
        if !object.contains_key("data") && !object.contains_key("message") {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    /// Whether the envelope reports success.
    pub fn is_success(&self) -> bool {
        self.code == ENVELOPE_SUCCESS
    }

    /// Message text, or an empty string.
    pub fn message_text(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}
