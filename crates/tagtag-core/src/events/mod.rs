//! Events emitted by the session core.
//!
//! Consumers (router guards, UI shells, audit hooks) subscribe to these
//! instead of polling the session state.

pub mod session;

pub use session::{LogoutReason, SessionEvent};
