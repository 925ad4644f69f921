//! Refresh coordination.

pub mod coordinator;

pub use coordinator::{RefreshCoordinator, RefreshState};
