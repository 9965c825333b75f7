//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so that an empty
//! configuration is valid.

pub mod database;
pub mod engine;
pub mod logging;
pub mod server;

use serde::{Deserialize, Serialize};

pub use self::database::{DatabaseBackend, DatabaseConfig};
pub use self::engine::{AccessConfig, PathConfig, ShareConfig};
pub use self::logging::LoggingConfig;
pub use self::server::ServerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// The top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `DOCVAULT__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistence backend settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Virtual path rules.
    #[serde(default)]
    pub paths: PathConfig,
    /// Share token settings.
    #[serde(default)]
    pub shares: ShareConfig,
    /// Permission resolution settings.
    #[serde(default)]
    pub access: AccessConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `DOCVAULT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = ::config::Config::builder()
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                ::config::Environment::with_prefix("DOCVAULT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let parsed: AppConfig = serde_json::from_str("{}").expect("empty config is valid");
        assert_eq!(parsed.database.backend, DatabaseBackend::Memory);
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.paths.max_rename_attempts, 1000);
        assert_eq!(parsed.shares.token_bytes, 32);
        assert!(parsed.shares.max_lifetime_hours.is_none());
        assert!(!parsed.access.require_upload_capability);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"database":{"backend":"postgres","url":"postgres://x"}}"#)
                .expect("valid config");
        assert_eq!(parsed.database.backend, DatabaseBackend::Postgres);
        assert_eq!(parsed.database.max_connections, 20);
        assert!(parsed.database.run_migrations);
    }

    #[test]
    fn test_bind_address() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_address(), "0.0.0.0:8080");
    }
}
