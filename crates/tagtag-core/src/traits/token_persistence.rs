//! Durable slot for the current token pair.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::StoredToken;

/// Trait for durable token slots (file, in-memory, or a platform keychain).
///
/// The slot holds at most one token; `save` overwrites it.
#[async_trait]
pub trait TokenPersistence: Send + Sync + std::fmt::Debug + 'static {
    /// Read the slot. Returns `None` when it is empty.
    async fn load(&self) -> AppResult<Option<StoredToken>>;

    /// Overwrite the slot.
    async fn save(&self, token: &StoredToken) -> AppResult<()>;

    /// Remove the slot. Clearing an empty slot succeeds.
    async fn clear(&self) -> AppResult<()>;
}
