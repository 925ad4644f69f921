//! Token storage: the in-memory store and its durable slots.

pub mod persistence;
pub mod store;

pub use persistence::{FileTokenPersistence, MemoryTokenPersistence};
pub use store::TokenStore;
