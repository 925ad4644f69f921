//! Scripted [`AuthApi`] used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use tagtag_core::error::AppError;
use tagtag_core::result::AppResult;
use tagtag_core::types::{
    CaptchaChallenge, CaptchaVerification, CaptchaVerifyRequest, Credentials, MenuRecord, Profile,
    RegisterRequest, TokenPair,
};

use super::api::AuthApi;

/// Responses are popped from per-call queues; an empty queue falls back to
/// a default (success for reads, `Network` for login/refresh).
#[derive(Debug, Default)]
pub(crate) struct MockAuthApi {
    login: Mutex<VecDeque<AppResult<TokenPair>>>,
    refresh: Mutex<VecDeque<AppResult<TokenPair>>>,
    refresh_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
    logout_error: Option<AppError>,
    profile_errors: Mutex<VecDeque<AppError>>,
    codes: Mutex<Vec<String>>,
    menus: Vec<MenuRecord>,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    refresh_tokens_seen: Mutex<Vec<String>>,
    profile_tokens_seen: Mutex<Vec<String>>,
}

impl MockAuthApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_login(self, result: AppResult<TokenPair>) -> Self {
        self.login.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_refresh(self, result: AppResult<TokenPair>) -> Self {
        self.refresh.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub(crate) fn with_logout_error(mut self, error: AppError) -> Self {
        self.logout_error = Some(error);
        self
    }

    pub(crate) fn with_profile_error(self, error: AppError) -> Self {
        self.fail_next_profile(error);
        self
    }

    /// Queues a profile failure for a later call.
    pub(crate) fn fail_next_profile(&self, error: AppError) {
        self.profile_errors.lock().unwrap().push_back(error);
    }

    pub(crate) fn with_codes(self, codes: &[&str]) -> Self {
        self.set_codes(codes);
        self
    }

    /// Replaces the codes served from now on.
    pub(crate) fn set_codes(&self, codes: &[&str]) {
        *self.codes.lock().unwrap() = codes.iter().map(|c| c.to_string()).collect();
    }

    pub(crate) fn with_menus(mut self, menus: Vec<MenuRecord>) -> Self {
        self.menus = menus;
        self
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_tokens_seen.lock().unwrap().clone()
    }

    pub(crate) fn profile_tokens_seen(&self) -> Vec<String> {
        self.profile_tokens_seen.lock().unwrap().clone()
    }

    async fn fetch_pause(&self) {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _credentials: &Credentials) -> AppResult<TokenPair> {
        let next = self.login.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(AppError::network("no scripted login")))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.refresh.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(AppError::network("no scripted refresh")))
    }

    async fn logout(&self, _access_token: &str) -> AppResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match &self.logout_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    async fn register(&self, _request: &RegisterRequest) -> AppResult<()> {
        Ok(())
    }

    async fn fetch_access_codes(&self, _access_token: &str) -> AppResult<Vec<String>> {
        self.fetch_pause().await;
        Ok(self.codes.lock().unwrap().clone())
    }

    async fn fetch_menus(&self, _access_token: &str) -> AppResult<Vec<MenuRecord>> {
        self.fetch_pause().await;
        Ok(self.menus.clone())
    }

    async fn fetch_profile(&self, access_token: &str) -> AppResult<Profile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile_tokens_seen
            .lock()
            .unwrap()
            .push(access_token.to_string());
        self.fetch_pause().await;
        let scripted = self.profile_errors.lock().unwrap().pop_front();
        if let Some(e) = scripted {
            return Err(e);
        }
        Ok(Profile {
            id: 1,
            username: "admin".to_string(),
            nickname: Some("Administrator".to_string()),
            ..Profile::default()
        })
    }

    async fn captcha_challenge(&self) -> AppResult<CaptchaChallenge> {
        Err(AppError::network("captcha not scripted"))
    }

    async fn verify_captcha(&self, _answer: &CaptchaVerifyRequest) -> AppResult<CaptchaVerification> {
        Err(AppError::network("captcha not scripted"))
    }
}
