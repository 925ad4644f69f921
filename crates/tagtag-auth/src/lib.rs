//! # tagtag-auth
//!
//! Session and authorization core for the Tagtag console client.
//!
//! ## Modules
//!
//! - `token`: in-memory token store with a durable slot and write epochs
//! - `client`: identity endpoint bindings (`AuthApi`) and the HTTP client
//! - `refresh`: single-flight refresh coordination
//! - `permission`: access-code index, menu tree, and route records
//! - `session`: the session controller tying the above together

pub mod client;
pub mod permission;
pub mod refresh;
pub mod session;
pub mod token;

pub use client::{AuthApi, HttpAuthClient};
pub use permission::{
    AccessCodeSet, MenuNode, MenuTree, PermissionResolver, ResolvedPermissions, RouteRecord,
};
pub use refresh::{RefreshCoordinator, RefreshState};
pub use session::{SessionController, SessionState};
pub use token::{FileTokenPersistence, MemoryTokenPersistence, TokenStore};
