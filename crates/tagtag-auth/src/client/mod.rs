//! Identity endpoint bindings.

pub mod api;
pub mod http;
pub mod paths;

pub use api::AuthApi;
pub use http::HttpAuthClient;

#[cfg(test)]
pub(crate) mod test_support;
