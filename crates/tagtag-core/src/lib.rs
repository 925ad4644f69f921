//! # tagtag-core
//!
//! Core crate for the Tagtag console session core. Contains the shared data
//! model (tokens, principals, menu records), configuration schemas, session
//! events, the token persistence trait, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Tagtag crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
