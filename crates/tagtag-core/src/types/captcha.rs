//! Slider ("translate") captcha challenge types.

use serde::{Deserialize, Serialize};

/// Challenge issued by `GET /auth/captcha/translate/init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaChallenge {
    /// Challenge identifier to echo back on verification.
    pub challenge_id: String,
    /// Background image.
    pub image_url: String,
    /// Allowed distance tolerance.
    #[serde(default)]
    pub diff_distance: Option<f64>,
    /// Piece x offset.
    pub piece_x: f64,
    /// Piece y offset.
    pub piece_y: f64,
    /// Expiry, epoch milliseconds.
    #[serde(default)]
    pub expire_at: Option<i64>,
}

/// Answer submitted to `POST /auth/captcha/translate/verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaVerifyRequest {
    /// Challenge being answered.
    pub challenge_id: String,
    /// Piece x offset from the challenge.
    pub piece_x: f64,
    /// Distance the user dragged the piece.
    pub move_x: f64,
    /// Time taken, milliseconds.
    pub time: u64,
}

/// Verification verdict; a passed challenge yields the login captcha token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaVerification {
    /// Whether the answer was accepted.
    pub passed: bool,
    /// Token to place in the login request.
    #[serde(default)]
    pub captcha_token: Option<String>,
}
