//! In-memory token store with a durable slot.
//!
//! The store is the single owner of the current [`TokenPair`]. Every write
//! bumps an epoch; writers that started before a competing write (a refresh
//! racing a logout, a login racing a teardown) use the `*_if_epoch` variants
//! so their late result is discarded instead of resurrecting a dead session.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use tagtag_core::traits::TokenPersistence;
use tagtag_core::types::{StoredToken, TokenPair};

#[derive(Debug, Default)]
struct Inner {
    current: Option<StoredToken>,
    epoch: u64,
}

/// Holds the current token pair and mirrors it into a durable slot.
#[derive(Debug)]
pub struct TokenStore {
    /// Current token and write epoch.
    inner: RwLock<Inner>,
    /// Durable slot, if persistence is enabled.
    persistence: Option<Arc<dyn TokenPersistence>>,
}

impl TokenStore {
    /// Creates a store that mirrors writes into `persistence`.
    pub fn new(persistence: Arc<dyn TokenPersistence>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            persistence: Some(persistence),
        }
    }

    /// Creates a store without a durable slot.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            persistence: None,
        }
    }

    /// Rehydrates the store from the durable slot.
    ///
    /// A slot that cannot be read or parsed is cleared and treated as empty.
    pub async fn restore(&self) -> Option<TokenPair> {
        let persistence = self.persistence.as_ref()?;

        let loaded = match persistence.load().await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable token slot");
                if let Err(e) = persistence.clear().await {
                    warn!(error = %e, "Failed to remove unreadable token slot");
                }
                None
            }
        };

        let stored = loaded?;
        let pair = stored.pair.clone();
        let mut inner = self.inner.write().await;
        inner.current = Some(stored);
        inner.epoch += 1;
        info!(epoch = inner.epoch, "Token restored from durable slot");
        Some(pair)
    }

    /// Returns the current token pair.
    pub async fn get(&self) -> Option<TokenPair> {
        self.inner
            .read()
            .await
            .current
            .as_ref()
            .map(|stored| stored.pair.clone())
    }

    /// Returns the current token with its obtained-at instant.
    pub async fn stored(&self) -> Option<StoredToken> {
        self.inner.read().await.current.clone()
    }

    /// Returns the current access token.
    pub async fn access_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .current
            .as_ref()
            .map(|stored| stored.pair.access_token.clone())
    }

    /// Returns the current write epoch.
    pub async fn epoch(&self) -> u64 {
        self.inner.read().await.epoch
    }

    /// Returns the current token and the epoch it belongs to.
    pub async fn snapshot(&self) -> (Option<StoredToken>, u64) {
        let inner = self.inner.read().await;
        (inner.current.clone(), inner.epoch)
    }

    /// Whether the current access token expires within `skew`.
    pub async fn is_expiring(&self, skew: Duration) -> bool {
        self.inner
            .read()
            .await
            .current
            .as_ref()
            .is_some_and(|stored| stored.is_expiring_at(Utc::now(), skew))
    }

    /// Replaces the current token. Returns the new epoch.
    pub async fn set(&self, pair: TokenPair) -> u64 {
        let mut inner = self.inner.write().await;
        self.write_locked(&mut inner, pair).await
    }

    /// Replaces the current token only if no write happened since `epoch`.
    ///
    /// Returns the new epoch, or `None` when the write was discarded.
    pub async fn set_if_epoch(&self, epoch: u64, pair: TokenPair) -> Option<u64> {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            debug!(
                expected = epoch,
                actual = inner.epoch,
                "Discarding token write from a superseded epoch"
            );
            return None;
        }
        Some(self.write_locked(&mut inner, pair).await)
    }

    /// Removes the current token and the durable slot. Returns the new epoch.
    pub async fn clear(&self) -> u64 {
        let mut inner = self.inner.write().await;
        self.clear_locked(&mut inner).await
    }

    /// Clears only if no write happened since `epoch`.
    ///
    /// Returns `true` if this call performed the clear.
    pub async fn clear_if_epoch(&self, epoch: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.epoch != epoch {
            return false;
        }
        self.clear_locked(&mut inner).await;
        true
    }

    /// Advances the epoch without touching the token.
    ///
    /// Any in-flight `*_if_epoch` write started before this call is discarded.
    pub async fn fence(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.epoch += 1;
        inner.epoch
    }

    async fn write_locked(&self, inner: &mut Inner, pair: TokenPair) -> u64 {
        let stored = StoredToken::new(pair);
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save(&stored).await {
                warn!(error = %e, "Failed to persist token; session will not survive restart");
            }
        }
        inner.current = Some(stored);
        inner.epoch += 1;
        inner.epoch
    }

    async fn clear_locked(&self, inner: &mut Inner) -> u64 {
        inner.current = None;
        inner.epoch += 1;
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.clear().await {
                warn!(error = %e, "Failed to remove token slot");
            }
        }
        inner.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenPersistence;

    fn pair(access: &str) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: Some(format!("{access}-refresh")),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(900),
        }
    }

    #[tokio::test]
    async fn test_set_get_clear_mirrors_slot() {
        let slot = Arc::new(MemoryTokenPersistence::new());
        let store = TokenStore::new(slot.clone());

        assert!(store.get().await.is_none());
        store.set(pair("a1")).await;
        assert_eq!(store.get().await, Some(pair("a1")));
        assert_eq!(
            slot.load().await.expect("load").map(|t| t.pair),
            Some(pair("a1"))
        );

        store.clear().await;
        assert!(store.get().await.is_none());
        assert!(slot.load().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn test_restore_from_slot() {
        let slot = Arc::new(MemoryTokenPersistence::with_token(StoredToken::new(pair("kept"))));
        let store = TokenStore::new(slot);

        assert_eq!(store.restore().await, Some(pair("kept")));
        assert_eq!(store.access_token().await.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_restore_discards_corrupt_file_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{broken").expect("write");

        let store = TokenStore::new(Arc::new(crate::token::FileTokenPersistence::new(&path)));
        assert!(store.restore().await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_epoch_guards_stale_writes() {
        let store = TokenStore::in_memory();
        let start = store.set(pair("a1")).await;

        store.clear().await;
        assert!(store.set_if_epoch(start, pair("stale")).await.is_none());
        assert!(store.get().await.is_none());

        let now = store.epoch().await;
        assert!(store.set_if_epoch(now, pair("a2")).await.is_some());
        assert_eq!(store.access_token().await.as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_fence_and_clear_if_epoch() {
        let store = TokenStore::in_memory();
        let epoch = store.set(pair("a1")).await;

        store.fence().await;
        assert!(!store.clear_if_epoch(epoch).await);
        assert!(store.get().await.is_some());

        let epoch = store.epoch().await;
        assert!(store.clear_if_epoch(epoch).await);
        assert!(!store.clear_if_epoch(epoch).await);
    }

    #[tokio::test]
    async fn test_is_expiring() {
        let store = TokenStore::in_memory();
        assert!(!store.is_expiring(Duration::seconds(30)).await);

        store.set(pair("a1")).await;
        assert!(!store.is_expiring(Duration::seconds(30)).await);
        assert!(store.is_expiring(Duration::seconds(900)).await);
    }
}
