//! HTTP implementation of [`AuthApi`] on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use tagtag_core::config::ApiConfig;
use tagtag_core::error::{AppError, ErrorKind};
use tagtag_core::result::AppResult;
use tagtag_core::types::{
    ApiEnvelope, CaptchaChallenge, CaptchaVerification, CaptchaVerifyRequest, Credentials,
    MenuRecord, Profile, RegisterRequest, TokenPair,
};

use super::api::AuthApi;
use super::paths;

/// How a failed response is classified, per endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Login,
    Refresh,
    Register,
    /// Bearer-authenticated reads.
    Protected,
    /// Anonymous helpers (captcha, logout).
    Public,
}

/// Identity endpoint client.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    /// Shared connection pool.
    http: Client,
    /// Base URL without trailing slash.
    base_url: String,
}

impl HttpAuthClient {
    /// Creates a client from the API configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self::with_client(http, &config.base_url))
    }

    /// Creates a client around an existing `reqwest::Client`.
    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B, T>(&self, path: &str, body: &B, kind: CallKind) -> AppResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        let payload = self.execute(request, path, kind).await?;
        decode(path, payload)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: Option<&str>,
        kind: CallKind,
    ) -> AppResult<T> {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        let payload = self.execute(request, path, kind).await?;
        decode(path, payload)
    }

    /// Sends the request and returns the unwrapped payload.
    async fn execute(&self, request: RequestBuilder, path: &str, kind: CallKind) -> AppResult<Value> {
        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Network,
                format!("Request to {path} failed: {e}"),
                e,
            )
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Network,
                format!("Failed to read response from {path}: {e}"),
                e,
            )
        })?;

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                Err(_) if !status.is_success() => Value::Null,
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Network,
                        format!("Malformed response from {path}"),
                        e,
                    ));
                }
            }
        };

        let envelope = ApiEnvelope::detect(&body);

        if !status.is_success() {
            let message = envelope
                .as_ref()
                .map(|env| env.message_text().to_string())
                .or_else(|| plain_message(&body))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            debug!(path = %path, status = status.as_u16(), message = %message, "Request rejected");
            return Err(classify(kind, status.as_u16(), &message));
        }

        match envelope {
            Some(env) if env.is_success() => Ok(env.data),
            Some(env) => {
                debug!(path = %path, code = env.code, message = %env.message_text(), "Request rejected in envelope");
                Err(classify(kind, env.code, env.message_text()))
            }
            None => Ok(body),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, credentials: &Credentials) -> AppResult<TokenPair> {
        self.post(paths::LOGIN, credentials, CallKind::Login).await
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let body = serde_json::json!({ "refreshToken": refresh_token });
        self.post(paths::REFRESH, &body, CallKind::Refresh).await
    }

    async fn logout(&self, access_token: &str) -> AppResult<()> {
        let body = serde_json::json!({ "accessToken": access_token });
        let request = self
            .http
            .post(self.url(paths::LOGOUT))
            .bearer_auth(access_token)
            .json(&body);
        self.execute(request, paths::LOGOUT, CallKind::Public)
            .await
            .map(drop)
    }

    async fn register(&self, request: &RegisterRequest) -> AppResult<()> {
        let request = self.http.post(self.url(paths::REGISTER)).json(request);
        self.execute(request, paths::REGISTER, CallKind::Register)
            .await
            .map(drop)
    }

    async fn fetch_access_codes(&self, access_token: &str) -> AppResult<Vec<String>> {
        let codes: Option<Vec<String>> = self
            .get(paths::ACCESS_CODES, Some(access_token), CallKind::Protected)
            .await?;
        Ok(codes.unwrap_or_default())
    }

    async fn fetch_menus(&self, access_token: &str) -> AppResult<Vec<MenuRecord>> {
        let menus: Option<Vec<MenuRecord>> = self
            .get(paths::MENUS, Some(access_token), CallKind::Protected)
            .await?;
        Ok(menus.unwrap_or_default())
    }

    async fn fetch_profile(&self, access_token: &str) -> AppResult<Profile> {
        self.get(paths::PROFILE, Some(access_token), CallKind::Protected)
            .await
    }

    async fn captcha_challenge(&self) -> AppResult<CaptchaChallenge> {
        self.get(paths::CAPTCHA_INIT, None, CallKind::Public).await
    }

    async fn verify_captcha(&self, answer: &CaptchaVerifyRequest) -> AppResult<CaptchaVerification> {
        self.post(paths::CAPTCHA_VERIFY, answer, CallKind::Public)
            .await
    }
}

fn decode<T: DeserializeOwned>(path: &str, payload: Value) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|e| {
        warn!(path = %path, error = %e, "Unexpected response shape");
        AppError::with_source(
            ErrorKind::Network,
            format!("Unexpected response shape from {path}: {e}"),
            e,
        )
    })
}

/// Pulls a `message`/`error` string out of a non-enveloped error body.
fn plain_message(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(String::from)
}

fn mentions_captcha(message: &str) -> bool {
    message.to_lowercase().contains("captcha") || message.contains("验证码")
}

/// Maps a rejected call onto the session error taxonomy.
fn classify(kind: CallKind, status: u16, message: &str) -> AppError {
    let detail = if message.is_empty() {
        format!("status {status}")
    } else {
        format!("{message} (status {status})")
    };

    match kind {
        CallKind::Login => {
            if status == StatusCode::PRECONDITION_REQUIRED.as_u16() || mentions_captcha(message) {
                AppError::captcha_required(detail)
            } else if matches!(status, 400 | 401 | 403) {
                AppError::invalid_credentials(detail)
            } else {
                AppError::network(detail)
            }
        }
        CallKind::Refresh => {
            if matches!(status, 400 | 401 | 403) {
                AppError::refresh_expired(detail)
            } else {
                AppError::network(detail)
            }
        }
        CallKind::Register => {
            if matches!(status, 400 | 409 | 422) {
                AppError::validation(detail)
            } else {
                AppError::network(detail)
            }
        }
        CallKind::Protected => {
            if status == 401 {
                AppError::token_expired(detail)
            } else {
                AppError::network(detail)
            }
        }
        CallKind::Public => AppError::network(detail),
    }
}
