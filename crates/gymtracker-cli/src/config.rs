//! Application configuration.
//!
//! Reads `config/default.toml` (or the path given with `--config`). A
//! missing file, or a missing section or key, falls back to the defaults
//! below. `GYMTRACKER_DATA_DIR` overrides `storage.data_dir`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "GYMTRACKER_DATA_DIR";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// `[storage]`: where the database and preference files live.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: "gymtracker.db".to_string(),
        }
    }
}

/// `[session]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub namespace: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: gymtracker_store::session::DEFAULT_NAMESPACE.to_string(),
        }
    }
}

/// `[auth]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
        }
    }
}

/// `[logging]`: default level when `RUST_LOG` is unset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load from `path`, then apply environment overrides.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.storage.data_dir = PathBuf::from(dir);
            }
        }

        Ok(config)
    }

    /// Parse TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Full path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.database)
    }

    /// Directory holding preference namespaces.
    pub fn prefs_dir(&self) -> PathBuf {
        self.storage.data_dir.join("prefs")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.storage.database, "gymtracker.db");
        assert_eq!(config.session.namespace, "UserSession");
        assert_eq!(config.auth.min_password_length, 6);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [storage]
            data_dir = "/var/lib/gymtracker"

            [auth]
            min_password_length = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/gymtracker"));
        assert_eq!(config.storage.database, "gymtracker.db");
        assert_eq!(config.auth.min_password_length, 10);
        assert_eq!(config.session.namespace, "UserSession");
    }

    #[test]
    fn derived_paths() {
        let config = Config::default();
        assert_eq!(config.database_path(), PathBuf::from("data/gymtracker.db"));
        assert_eq!(config.prefs_dir(), PathBuf::from("data/prefs"));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = Config::parse(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.storage.database, "gymtracker.db");
        assert_eq!(config.session.namespace, "UserSession");
        assert_eq!(config.auth.min_password_length, 6);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::parse("[storage\ndata_dir = 1").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.auth.min_password_length, 6);
    }
}
