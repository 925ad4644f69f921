//! Session controller.
//!
//! One controller per process. It owns the token store, the refresh
//! coordinator, and the session context (principal, access codes, menu
//! tree), and is the only component that builds or tears down that context.
//!
//! Every session-wide change (login apply, logout, forced logout, teardown)
//! happens while holding the context write lock and bumps a generation
//! counter. Work that started under an older generation is discarded.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tagtag_core::config::AppConfig;
use tagtag_core::error::{AppError, ErrorKind};
use tagtag_core::events::{LogoutReason, SessionEvent};
use tagtag_core::result::AppResult;
use tagtag_core::types::{
    CaptchaChallenge, CaptchaVerification, CaptchaVerifyRequest, Credentials, Principal,
    RegisterRequest, StoredToken, TokenPair,
};

use crate::client::{AuthApi, HttpAuthClient};
use crate::permission::{AccessCodeSet, MenuTree, PermissionResolver, ResolvedPermissions};
use crate::refresh::RefreshCoordinator;
use crate::token::{FileTokenPersistence, TokenStore};

use super::state::SessionState;

/// Event channel capacity.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Default)]
struct SessionContext {
    generation: u64,
    principal: Option<Principal>,
    permissions: ResolvedPermissions,
}

impl SessionContext {
    fn reset(&mut self) {
        self.principal = None;
        self.permissions = ResolvedPermissions::default();
    }
}

/// Process-scoped session context and lifecycle.
#[derive(Debug)]
pub struct SessionController {
    api: Arc<dyn AuthApi>,
    store: Arc<TokenStore>,
    coordinator: RefreshCoordinator,
    resolver: PermissionResolver,
    /// How long before expiry a token counts as expiring.
    refresh_skew: Duration,
    context: RwLock<SessionContext>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    /// Last store epoch announced as `TokenRefreshed` or applied by login.
    announced_epoch: AtomicU64,
}

impl SessionController {
    /// Creates a controller over an existing client and store.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<TokenStore>, refresh_skew: Duration) -> Self {
        let coordinator = RefreshCoordinator::new(Arc::clone(&api), Arc::clone(&store));
        let resolver = PermissionResolver::new(Arc::clone(&api));
        let (state, _) = watch::channel(SessionState::Anonymous);
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        Self {
            api,
            store,
            coordinator,
            resolver,
            refresh_skew,
            context: RwLock::new(SessionContext::default()),
            state,
            events,
            announced_epoch: AtomicU64::new(0),
        }
    }

    /// Creates a controller with the HTTP client and the configured token slot.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let api: Arc<dyn AuthApi> = Arc::new(HttpAuthClient::new(&config.api)?);

        let store = if config.session.persist {
            TokenStore::new(Arc::new(FileTokenPersistence::new(
                &config.session.token_file,
            )))
        } else {
            TokenStore::in_memory()
        };

        let skew = i64::try_from(config.session.refresh_skew_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AppError::configuration("session.refresh_skew_seconds is out of range"))?;

        Ok(Self::new(api, Arc::new(store), skew))
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Restores a persisted token and rebuilds the session context.
    ///
    /// Returns `None` when there is nothing to restore. A network failure
    /// keeps the persisted token so a later start can retry; any other
    /// failure discards it.
    pub async fn init(&self) -> AppResult<Option<Principal>> {
        if self.store.restore().await.is_none() {
            debug!("No persisted session");
            return Ok(None);
        }

        let generation = self.begin(SessionState::Authenticating).await;

        let outcome = async {
            let (principal, permissions) =
                self.authorized(|token| self.fetch_context(token)).await?;
            self.apply(generation, principal.clone(), permissions, None)
                .await?;
            Ok::<_, AppError>(principal)
        }
        .await;

        match outcome {
            Ok(principal) => {
                info!(user_id = principal.id, username = %principal.username, "Session restored");
                self.emit(SessionEvent::Restored {
                    user_id: principal.id,
                });
                Ok(Some(principal))
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore session");
                self.abandon(generation, !e.is_retryable()).await;
                Err(e)
            }
        }
    }

    /// Logs in and builds the session context.
    ///
    /// Profile, access codes, and menus are fetched concurrently. Nothing is
    /// stored until all of them succeed; on failure the session returns to
    /// `Anonymous` with no token and no context.
    pub async fn login(&self, credentials: &Credentials) -> AppResult<Principal> {
        let generation = self.begin(SessionState::Authenticating).await;
        info!(username = %credentials.username, "Logging in");

        let outcome = async {
            let pair = self.api.login(credentials).await?;
            let (principal, permissions) = self.fetch_context(pair.access_token.clone()).await?;
            self.apply(generation, principal.clone(), permissions, Some(pair))
                .await?;
            Ok::<_, AppError>(principal)
        }
        .await;

        match outcome {
            Ok(principal) => {
                info!(user_id = principal.id, username = %principal.username, "Login successful");
                self.emit(SessionEvent::LoggedIn {
                    user_id: principal.id,
                    username: principal.username.clone(),
                });
                Ok(principal)
            }
            Err(e) => {
                warn!(username = %credentials.username, error = %e, "Login failed");
                self.abandon(generation, true).await;
                Err(e)
            }
        }
    }

    /// Ends the session locally and notifies the server in the background.
    ///
    /// The local session is always cleared, whatever the server says.
    /// Returns the handle of the notify task, if a token was there to revoke.
    pub async fn logout(&self) -> Option<JoinHandle<()>> {
        let token = {
            let mut ctx = self.context.write().await;
            ctx.generation += 1;
            let token = self.store.access_token().await;
            self.store.clear().await;
            ctx.reset();
            self.state.send_replace(SessionState::Anonymous);
            token
        };

        info!("Logged out");
        self.emit(SessionEvent::LoggedOut {
            reason: LogoutReason::UserRequested,
        });

        let token = token?;
        let api = Arc::clone(&self.api);
        Some(tokio::spawn(async move {
            match api.logout(&token).await {
                Ok(()) => debug!("Server session revoked"),
                Err(e) => warn!(error = %e, "Server logout failed; local session already cleared"),
            }
        }))
    }

    /// Aborts in-flight login and refresh work and drops the in-memory context.
    ///
    /// The persisted token is left in place for the next start.
    pub async fn teardown(&self) {
        {
            let mut ctx = self.context.write().await;
            ctx.generation += 1;
            self.store.fence().await;
            ctx.reset();
            self.state.send_replace(SessionState::Anonymous);
        }

        debug!("Session controller torn down");
        self.emit(SessionEvent::LoggedOut {
            reason: LogoutReason::Teardown,
        });
    }

    /// Fetches access codes, menus, and the profile again and replaces the context.
    pub async fn reload_permissions(&self) -> AppResult<()> {
        if !self.is_authenticated() {
            return Err(AppError::unauthenticated("Not logged in"));
        }
        let generation = self.context.read().await.generation;

        let (principal, permissions) = self.authorized(|token| self.fetch_context(token)).await?;
        let access_codes = permissions.codes.len();
        let menus = permissions.record_count;
        self.apply(generation, principal, permissions, None).await?;

        info!(access_codes, menus, "Permissions reloaded");
        self.emit(SessionEvent::PermissionsReloaded {
            access_codes,
            menus,
        });
        Ok(())
    }

    /// Registers a new account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<()> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }
        self.api.register(request).await?;
        info!(username = %request.username, "Account registered");
        Ok(())
    }

    /// Starts a captcha challenge.
    pub async fn captcha_challenge(&self) -> AppResult<CaptchaChallenge> {
        self.api.captcha_challenge().await
    }

    /// Submits a captcha answer; a passing answer carries the login captcha token.
    pub async fn verify_captcha(
        &self,
        answer: &CaptchaVerifyRequest,
    ) -> AppResult<CaptchaVerification> {
        self.api.verify_captcha(answer).await
    }

    // ── Tokens ────────────────────────────────────────────────────────────

    /// Returns an access token that is not about to expire.
    ///
    /// Refreshes through the coordinator when the token expires within the
    /// configured skew.
    pub async fn ensure_fresh_token(&self) -> AppResult<String> {
        let Some(stored) = self.store.stored().await else {
            return Err(AppError::unauthenticated("Not logged in"));
        };

        if stored.is_expiring_at(Utc::now(), self.refresh_skew) {
            debug!("Access token expiring, refreshing ahead of use");
            let pair = self.refresh_with(Some(&stored.pair.access_token)).await?;
            return Ok(pair.access_token);
        }

        Ok(stored.pair.access_token)
    }

    /// Handles a server-side rejection of `failed_access_token`.
    ///
    /// Returns the access token to retry with.
    pub async fn handle_token_expired(&self, failed_access_token: &str) -> AppResult<String> {
        let pair = self.refresh_with(Some(failed_access_token)).await?;
        Ok(pair.access_token)
    }

    /// Runs a protected call with a fresh token.
    ///
    /// If the server rejects the token with `TokenExpired`, the token is
    /// refreshed once and the call is retried once.
    pub async fn authorized<F, Fut, T>(&self, call: F) -> AppResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let token = self.ensure_fresh_token().await?;
        match call(token.clone()).await {
            Err(e) if e.kind == ErrorKind::TokenExpired => {
                debug!("Access token rejected by server, refreshing");
                let fresh = self.handle_token_expired(&token).await?;
                call(fresh).await
            }
            other => other,
        }
    }

    async fn refresh_with(&self, failed_access_token: Option<&str>) -> AppResult<TokenPair> {
        let generation = self.context.read().await.generation;
        let mut established = false;
        self.state.send_if_modified(|state| {
            established = state.is_authenticated();
            if *state == SessionState::Authenticated {
                *state = SessionState::RefreshingSilently;
                true
            } else {
                false
            }
        });

        let result = self.coordinator.refresh(failed_access_token).await;

        match &result {
            Ok(pair) => {
                let epoch = self.store.epoch().await;
                if self.announced_epoch.fetch_max(epoch, Ordering::SeqCst) < epoch {
                    if established {
                        self.rebuild_context(generation, pair).await?;
                    }
                    self.emit(SessionEvent::TokenRefreshed);
                }
                self.settle_refreshing();
            }
            Err(e) if e.kind == ErrorKind::RefreshExpired => {
                self.invalidate(generation).await;
            }
            Err(_) => self.settle_refreshing(),
        }

        result
    }

    /// Rebuilds principal, access codes, and menus for a refreshed token.
    ///
    /// Runs once per new store epoch. A fetch failure keeps the previous
    /// context; a session change while fetching discards the refresh.
    async fn rebuild_context(&self, generation: u64, pair: &TokenPair) -> AppResult<()> {
        let (principal, permissions) = match self.fetch_context(pair.access_token.clone()).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, "Failed to rebuild session context after refresh");
                return Ok(());
            }
        };

        let access_codes = permissions.codes.len();
        let menus = permissions.record_count;
        self.apply(generation, principal, permissions, None).await?;
        debug!(access_codes, menus, "Session context rebuilt after refresh");
        Ok(())
    }

    fn settle_refreshing(&self) {
        self.state.send_if_modified(|state| {
            if *state == SessionState::RefreshingSilently {
                *state = SessionState::Authenticated;
                true
            } else {
                false
            }
        });
    }

    /// Ends the session after a terminal refresh failure.
    ///
    /// Only the first caller for a given generation clears anything and emits
    /// `ForcedLogout`; the rest are no-ops.
    async fn invalidate(&self, generation: u64) -> bool {
        {
            let mut ctx = self.context.write().await;
            if ctx.generation != generation {
                debug!("Session already invalidated");
                return false;
            }
            ctx.generation += 1;
            self.store.clear().await;
            ctx.reset();
            self.state.send_replace(SessionState::Anonymous);
        }

        warn!("Refresh token rejected, session ended");
        self.emit(SessionEvent::ForcedLogout {
            reason: LogoutReason::RefreshExpired,
        });
        true
    }

    // ── Context building ──────────────────────────────────────────────────

    async fn begin(&self, state: SessionState) -> u64 {
        let mut ctx = self.context.write().await;
        ctx.generation += 1;
        self.state.send_replace(state);
        ctx.generation
    }

    async fn fetch_context(
        &self,
        access_token: String,
    ) -> AppResult<(Principal, ResolvedPermissions)> {
        let (profile, permissions) = tokio::try_join!(
            self.api.fetch_profile(&access_token),
            self.resolver.resolve(&access_token)
        )?;

        let codes = permissions.codes.sorted().into_iter().map(String::from);
        let principal = Principal::from_profile(profile, codes);
        Ok((principal, permissions))
    }

    /// Installs a freshly built context, and the login pair if there is one.
    async fn apply(
        &self,
        generation: u64,
        principal: Principal,
        permissions: ResolvedPermissions,
        pair: Option<TokenPair>,
    ) -> AppResult<()> {
        let mut ctx = self.context.write().await;
        if ctx.generation != generation {
            return Err(AppError::aborted("Session changed while loading"));
        }

        if let Some(pair) = pair {
            let epoch = self.store.set(pair).await;
            self.announced_epoch.fetch_max(epoch, Ordering::SeqCst);
        }

        ctx.principal = Some(principal);
        ctx.permissions = permissions;
        self.state.send_replace(SessionState::Authenticated);
        Ok(())
    }

    /// Drops a failed login/restore, unless something newer took over.
    async fn abandon(&self, generation: u64, clear_token: bool) {
        let mut ctx = self.context.write().await;
        if ctx.generation != generation {
            return;
        }
        if clear_token {
            self.store.clear().await;
        }
        ctx.reset();
        self.state.send_replace(SessionState::Anonymous);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Whether a usable session exists.
    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Whether the session holds `code`.
    pub async fn can(&self, code: &str) -> bool {
        self.context.read().await.permissions.codes.can(code)
    }

    /// The logged-in principal.
    pub async fn principal(&self) -> Option<Principal> {
        self.context.read().await.principal.clone()
    }

    /// Granted access codes.
    pub async fn access_codes(&self) -> AccessCodeSet {
        self.context.read().await.permissions.codes.clone()
    }

    /// The session's menu tree.
    pub async fn menu_tree(&self) -> MenuTree {
        self.context.read().await.permissions.menus.clone()
    }

    /// The current access token, without refreshing.
    pub async fn access_token(&self) -> Option<String> {
        self.store.access_token().await
    }

    /// The current token with its obtained-at instant.
    pub async fn token(&self) -> Option<StoredToken> {
        self.store.stored().await
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
