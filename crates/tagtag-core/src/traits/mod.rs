//! Core traits defined in `tagtag-core` and implemented by other crates.

pub mod token_persistence;

pub use token_persistence::TokenPersistence;
