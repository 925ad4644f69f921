//! Client configuration schemas.
//!
//! Configuration is deserialized from TOML files via the `config` crate.
//! Each sub-module represents a logical configuration section.

pub mod api;
pub mod logging;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::api::ApiConfig;
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root client configuration.
///
/// Top-level deserialization target for the merged configuration
/// (default.toml + environment overlay + `TAGTAG__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Session and token slot settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default` with an environment-specific overlay and
    /// environment variables prefixed with `TAGTAG__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));

        Self::finish(builder)
    }

    /// Load configuration from a single explicit file (plus environment).
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        let builder =
            config::Config::builder().add_source(config::File::with_name(path).required(false));

        Self::finish(builder)
    }

    /// Layers `TAGTAG__*` variables on top and deserializes.
    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("TAGTAG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config: AppConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_seconds, 15);
        assert_eq!(config.session.refresh_skew_seconds, 30);
        assert!(config.session.persist);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api": {"base_url": "https://iam.example.com"}}"#)
                .expect("partial config");
        assert_eq!(config.api.base_url, "https://iam.example.com");
        assert_eq!(config.api.timeout_seconds, 15);
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[api]\ntimeout_seconds = \"soon\"\n").expect("write");

        let err = AppConfig::load_file(path.to_str().expect("utf-8 path")).expect_err("invalid");
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
        assert!(err.message.starts_with("Configuration error"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");

        let config = AppConfig::load_file(path.to_str().expect("utf-8 path")).expect("defaults");
        assert_eq!(config.api.timeout_seconds, 15);
    }
}
