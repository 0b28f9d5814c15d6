//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `hb-portal.toml` (or the file given with `--config`)
//! 3. Environment variables
//! 4. CLI flags (applied by the `cli` module)
//!
//! ## Environment Variables
//!
//! - `HB_PORTAL_ADMIN_KEY`: shared secret for `/admin/*` routes
//! - `HB_PORTAL_RATE_LIMIT`: requests per second (0 disables limiting)
//! - `HB_PORTAL_CORS_ORIGINS`: comma-separated origins, or "*" for all
//! - `HB_PORTAL_ENVIRONMENT`: free-form label, e.g. "development" or "production"

use hb_portal_core::PortalError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "hb-portal.toml";

/// Largest config file accepted (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

pub const ENV_ADMIN_KEY: &str = "HB_PORTAL_ADMIN_KEY";
pub const ENV_RATE_LIMIT: &str = "HB_PORTAL_RATE_LIMIT";
pub const ENV_CORS_ORIGINS: &str = "HB_PORTAL_CORS_ORIGINS";
pub const ENV_ENVIRONMENT: &str = "HB_PORTAL_ENVIRONMENT";

/// Runtime settings of the portal server and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Deployment label; "production" tightens a few warnings.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Database path, overridden by `--database`.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Storage backend: "file" or "redb".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Shared secret for admin routes. Admin routes are refused when unset.
    #[serde(default)]
    pub admin_key: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Requests per second; 0 disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Comma-separated allowed origins, or "*". Localhost only when unset.
    #[serde(default)]
    pub cors_origins: Option<String>,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_database() -> PathBuf {
    PathBuf::from("hb-portal.db")
}

fn default_backend() -> String {
    "redb".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_rate_limit() -> u32 {
    100
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            database: default_database(),
            backend: default_backend(),
            admin_key: None,
            host: default_host(),
            port: default_port(),
            rate_limit: default_rate_limit(),
            cors_origins: None,
        }
    }
}

impl PortalConfig {
    /// Parse a config from TOML text. Absent keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, PortalError> {
        toml::from_str(text)
            .map_err(|e| PortalError::DeserializationError(format!("Invalid config: {}", e)))
    }

    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self, PortalError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PortalError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PortalError::InvalidInput(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| PortalError::IoError(format!("Read config: {}", e)))?;
        Self::from_toml(&text)
    }

    /// Resolve the file and environment layers.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, PortalError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Empty values are ignored; an unparseable rate limit keeps the
    /// current value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_ADMIN_KEY) {
            self.admin_key = Some(key);
        }
        if let Some(raw) = get(ENV_RATE_LIMIT) {
            match raw.trim().parse() {
                Ok(rps) => self.rate_limit = rps,
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", ENV_RATE_LIMIT, raw),
            }
        }
        if let Some(origins) = get(ENV_CORS_ORIGINS) {
            self.cors_origins = Some(origins);
        }
        if let Some(environment) = get(ENV_ENVIRONMENT) {
            self.environment = environment;
        }
    }

    /// The admin key, if one is configured and non-empty.
    #[must_use]
    pub fn admin_key(&self) -> Option<&str> {
        self.admin_key.as_deref().filter(|k| !k.is_empty())
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PortalConfig::from_toml("").expect("parse");
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.rate_limit, 100);
        assert!(config.admin_key().is_none());
    }

    #[test]
    fn toml_overrides_some_keys() {
        let config = PortalConfig::from_toml(
            r#"
environment = "production"
backend = "file"
admin_key = "hb-secret"
port = 9090
"#,
        )
        .expect("parse");
        assert!(config.is_production());
        assert_eq!(config.backend, "file");
        assert_eq!(config.admin_key(), Some("hb-secret"));
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn malformed_toml_rejected() {
        let result = PortalConfig::from_toml("port = \"eighty\"");
        assert!(matches!(result, Err(PortalError::DeserializationError(_))));
    }

    #[test]
    fn environment_layer_wins() {
        let env: HashMap<&str, &str> = [
            (ENV_ADMIN_KEY, "from-env"),
            (ENV_RATE_LIMIT, "0"),
            (ENV_CORS_ORIGINS, "*"),
            (ENV_ENVIRONMENT, "staging"),
        ]
        .into_iter()
        .collect();

        let mut config = PortalConfig::from_toml("admin_key = \"from-file\"").expect("parse");
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.admin_key(), Some("from-env"));
        assert_eq!(config.rate_limit, 0);
        assert_eq!(config.cors_origins.as_deref(), Some("*"));
        assert_eq!(config.environment, "staging");
    }

    #[test]
    fn blank_or_invalid_env_values_ignored() {
        let mut config = PortalConfig::default();
        config.apply_overrides(|key| match key {
            ENV_ADMIN_KEY => Some("   ".to_string()),
            ENV_RATE_LIMIT => Some("fast".to_string()),
            _ => None,
        });
        assert!(config.admin_key().is_none());
        assert_eq!(config.rate_limit, 100);
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let result = PortalConfig::load(Some(&temp.path().join("missing.toml")));
        assert!(matches!(result, Err(PortalError::IoError(_))));
    }

    #[test]
    fn reads_file_from_disk() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("hb-portal.toml");
        std::fs::write(&path, "rate_limit = 25\n").expect("write");
        let config = PortalConfig::from_file(&path).expect("load");
        assert_eq!(config.rate_limit, 25);
    }
}
