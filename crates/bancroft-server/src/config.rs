//! Server configuration loading.
//!
//! Layered: a TOML file (when present) with `BANCROFT_`-prefixed
//! environment variables on top, e.g. `BANCROFT_PORTAL__IDP__CLIENT_ID`
//! overrides `[portal.idp] client_id`.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use bancroft_auth::PortalConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "bancroft.toml";

/// Complete server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:8080`.
    pub listen: String,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Sign-in flow configuration.
    pub portal: PortalConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            logging: LoggingConfig::default(),
            portal: PortalConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter, overridden by `RUST_LOG` when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Loads configuration from the given file (optional) plus environment
/// overrides.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the file or an override cannot be
/// parsed; a missing file is not an error, the defaults apply.
pub fn load_config(path: Option<&str>) -> Result<ServerConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::new(path, FileFormat::Toml).required(false));
    }
    builder = builder.add_source(Environment::with_prefix("BANCROFT").separator("__"));

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:8080");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = load_config(Some("does-not-exist.toml")).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_file_values_are_applied() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
listen = "0.0.0.0:9000"

[logging]
level = "debug"

[portal.idp]
client_id = "portal-web"

[portal.otp]
resend_cooldown = "45s"
"#
        )
        .unwrap();

        let cfg = load_config(file.path().to_str()).unwrap();
        assert_eq!(cfg.listen, "0.0.0.0:9000");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.portal.idp.client_id, "portal-web");
        assert_eq!(
            cfg.portal.otp.resend_cooldown,
            std::time::Duration::from_secs(45)
        );
    }
}
