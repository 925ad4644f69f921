//! The identity endpoint contract.

use async_trait::async_trait;

use tagtag_core::result::AppResult;
use tagtag_core::types::{
    CaptchaChallenge, CaptchaVerification, CaptchaVerifyRequest, Credentials, MenuRecord, Profile,
    RegisterRequest, TokenPair,
};

/// Calls against the identity endpoint.
///
/// Each method is exactly one network round trip with no local caching.
/// Implementations map server responses onto the session error kinds:
/// `InvalidCredentials`/`CaptchaRequired` for login rejections,
/// `RefreshExpired` for a rejected refresh token, `TokenExpired` for a
/// rejected access token, and `Network` for everything transient.
#[async_trait]
pub trait AuthApi: Send + Sync + std::fmt::Debug + 'static {
    /// Exchanges credentials for a token pair.
    async fn login(&self, credentials: &Credentials) -> AppResult<TokenPair>;

    /// Exchanges a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Tells the server the access token is being discarded.
    async fn logout(&self, access_token: &str) -> AppResult<()>;

    /// Creates a new account.
    async fn register(&self, request: &RegisterRequest) -> AppResult<()>;

    /// Fetches the principal's access codes.
    async fn fetch_access_codes(&self, access_token: &str) -> AppResult<Vec<String>>;

    /// Fetches the principal's flat menu records.
    async fn fetch_menus(&self, access_token: &str) -> AppResult<Vec<MenuRecord>>;

    /// Fetches the principal's profile.
    async fn fetch_profile(&self, access_token: &str) -> AppResult<Profile>;

    /// Requests a slider captcha challenge.
    async fn captcha_challenge(&self) -> AppResult<CaptchaChallenge>;

    /// Submits a slider captcha answer.
    async fn verify_captcha(&self, answer: &CaptchaVerifyRequest) -> AppResult<CaptchaVerification>;
}
