//! Single-flight token refresh.
//!
//! Many protected calls can notice an expired token at the same moment.
//! Refresh tokens rotate, so letting each caller refresh on its own would
//! make them invalidate each other. The coordinator keeps one shared
//! pending-result handle: the first caller creates it, every later caller
//! attaches to it, and all of them observe the same outcome.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, info, warn};

use tagtag_core::error::{AppError, ErrorKind};
use tagtag_core::result::AppResult;
use tagtag_core::types::TokenPair;

use crate::client::AuthApi;
use crate::token::TokenStore;

type RefreshFuture = Shared<BoxFuture<'static, AppResult<TokenPair>>>;

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh in flight.
    Idle,
    /// A refresh call is in flight; new requests attach to it.
    Refreshing,
}

/// The in-flight refresh, tagged so only its own completion clears the slot.
struct InFlight {
    id: u64,
    future: RefreshFuture,
}

#[derive(Default)]
struct Slot {
    in_flight: Option<InFlight>,
    next_id: u64,
}

/// Serializes refresh attempts for one session.
pub struct RefreshCoordinator {
    /// Identity endpoint.
    api: Arc<dyn AuthApi>,
    /// Token store the refreshed pair is written to.
    store: Arc<TokenStore>,
    /// Shared in-flight slot.
    slot: Arc<Mutex<Slot>>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .finish()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator writing into `store`.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<TokenStore>) -> Self {
        Self {
            api,
            store,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Current state.
    pub fn state(&self) -> RefreshState {
        if lock_slot(&self.slot).in_flight.is_some() {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Obtains a fresh token pair, joining an in-flight refresh if there is one.
    ///
    /// `failed_access_token` is the access token the caller saw rejected. If
    /// the store already holds a different one, another caller has refreshed
    /// in the meantime and that pair is returned without a network call.
    ///
    /// The refreshed pair is written to the store before any caller sees it.
    /// If the store was written by someone else while the call was in flight
    /// (logout, teardown, a new login), the result is discarded and every
    /// caller gets an `Aborted` error.
    pub async fn refresh(&self, failed_access_token: Option<&str>) -> AppResult<TokenPair> {
        let future = {
            let mut slot = lock_slot(&self.slot);

            match &slot.in_flight {
                Some(in_flight) => {
                    debug!(refresh_id = in_flight.id, "Joining in-flight refresh");
                    in_flight.future.clone()
                }
                None => {
                    slot.next_id += 1;
                    let id = slot.next_id;
                    let future = self.start(id, failed_access_token.map(String::from));
                    slot.in_flight = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        future.await
    }

    /// Builds the shared refresh future for attempt `id`.
    fn start(&self, id: u64, failed_access_token: Option<String>) -> RefreshFuture {
        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);
        let slot = Arc::clone(&self.slot);

        async move {
            let result = run_refresh(id, api.as_ref(), &store, failed_access_token).await;

            {
                let mut slot = lock_slot(&slot);
                if slot.in_flight.as_ref().is_some_and(|f| f.id == id) {
                    slot.in_flight = None;
                }
            }

            result
        }
        .boxed()
        .shared()
    }
}

/// The slot holds no invariant a panicking holder could break, so a
/// poisoned lock is recovered rather than reported.
fn lock_slot(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_refresh(
    id: u64,
    api: &dyn AuthApi,
    store: &TokenStore,
    failed_access_token: Option<String>,
) -> AppResult<TokenPair> {
    let (current, epoch) = store.snapshot().await;

    let Some(current) = current else {
        return Err(AppError::unauthenticated("No session to refresh"));
    };

    if let Some(failed) = failed_access_token.as_deref() {
        if current.pair.access_token != failed {
            debug!(refresh_id = id, "Token already replaced, skipping refresh call");
            return Ok(current.pair);
        }
    }

    let Some(refresh_token) = current.pair.refresh_token.clone() else {
        warn!(refresh_id = id, "Session has no refresh token");
        return Err(AppError::refresh_expired("Session has no refresh token"));
    };

    info!(refresh_id = id, epoch = epoch, "Refreshing access token");

    match api.refresh(&refresh_token).await {
        Ok(mut pair) => {
            // Servers that do not rotate refresh tokens omit it from the response.
            if pair.refresh_token.is_none() {
                pair.refresh_token = Some(refresh_token);
            }
            match store.set_if_epoch(epoch, pair.clone()).await {
                Some(new_epoch) => {
                    info!(refresh_id = id, epoch = new_epoch, "Access token refreshed");
                    Ok(pair)
                }
                None => {
                    warn!(refresh_id = id, "Session changed during refresh, discarding result");
                    Err(AppError::aborted("Session changed while refreshing"))
                }
            }
        }
        Err(e) => {
            match e.kind {
                ErrorKind::RefreshExpired => {
                    warn!(refresh_id = id, error = %e, "Refresh token rejected")
                }
                _ => warn!(refresh_id = id, error = %e, "Refresh failed"),
            }
            Err(e)
        }
    }
}
