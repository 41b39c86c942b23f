//! Service configuration with layered loading.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (`BLOCKGAME_ASSETS_*`)
//! 2. TOML file named by `BLOCKGAME_ASSETS_CONFIG` (if set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "BLOCKGAME_ASSETS_CONFIG";

/// Prefix for per-field environment overrides.
pub const ENV_PREFIX: &str = "BLOCKGAME_ASSETS_";

/// Public host the asset files themselves are downloaded from.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://assets.blockgame.james090500.com/";

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    ///
    /// Set via `BLOCKGAME_ASSETS_LISTEN`.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory the filesystem object store serves from.
    ///
    /// Set via `BLOCKGAME_ASSETS_STORE_ROOT`.
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// Prefix joined with an object key to form an asset's download URL.
    /// Must end with `/`.
    ///
    /// Set via `BLOCKGAME_ASSETS_PUBLIC_BASE_URL`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// `max-age` sent with cached listings.
    ///
    /// Set via `BLOCKGAME_ASSETS_CACHE_MAX_AGE_SECS`.
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
}

fn default_listen() -> String {
    "0.0.0.0:8787".into()
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_public_base_url() -> String {
    DEFAULT_PUBLIC_BASE_URL.into()
}

fn default_cache_max_age_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            store_root: default_store_root(),
            public_base_url: default_public_base_url(),
            cache_max_age_secs: default_cache_max_age_secs(),
        }
    }
}

impl Config {
    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, a variable cannot
    /// be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered provider stack `load` extracts from.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var(CONFIG_FILE_ENV) {
            figment = figment.merge(Toml::file(config_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "listen".into(),
                reason: format!("`{}` is not a socket address", self.listen),
            });
        }
        if self.public_base_url.is_empty() || !self.public_base_url.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "public_base_url".into(),
                reason: "must be non-empty and end with `/`".into(),
            });
        }
        if self.cache_max_age_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_max_age_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.listen, "0.0.0.0:8787");
        assert_eq!(config.store_root, PathBuf::from("./assets"));
        assert_eq!(config.public_base_url, "https://assets.blockgame.james090500.com/");
        assert_eq!(config.cache_max_age_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_toml_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "assets.toml",
                r#"
                    listen = "127.0.0.1:9000"
                    cache_max_age_secs = 60
                "#,
            )?;
            jail.set_env(CONFIG_FILE_ENV, "assets.toml");
            jail.set_env("BLOCKGAME_ASSETS_CACHE_MAX_AGE_SECS", "120");

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.listen, "127.0.0.1:9000");
            assert_eq!(config.cache_max_age_secs, 120);
            assert_eq!(config.public_base_url, DEFAULT_PUBLIC_BASE_URL);
            Ok(())
        });
    }

    #[test]
    fn rejects_bad_values() {
        let bad_listen = Config { listen: "nowhere".into(), ..Default::default() };
        assert!(matches!(bad_listen.validate(), Err(ConfigError::Invalid { field, .. }) if field == "listen"));

        let bad_url = Config { public_base_url: "https://cdn.example.com".into(), ..Default::default() };
        assert!(matches!(bad_url.validate(), Err(ConfigError::Invalid { field, .. }) if field == "public_base_url"));

        let bad_age = Config { cache_max_age_secs: 0, ..Default::default() };
        assert!(bad_age.validate().is_err());
    }
}
