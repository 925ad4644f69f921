//! Convenience result type alias for Tagtag.

use crate::error::AppError;

/// A specialized `Result` type for session core operations.
pub type AppResult<T> = Result<T, AppError>;
