//! # vitalis-config
//!
//! Layered configuration loading for Vitalis using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`VITALIS_*` prefix, `__` as separator)
//! 2. Project-level `.vitalis/config.toml`
//! 3. User-level `~/.config/vitalis/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `VITALIS_DATABASE__PATH` -> `database.path`,
//! `VITALIS_BOOTSTRAP__MAX_ATTEMPTS` -> `bootstrap.max_attempts`, etc.
//!
//! ```no_run
//! use vitalis_config::VitalisConfig;
//!
//! let config = VitalisConfig::load_with_dotenv().expect("config");
//! println!("database at {}", config.database.path);
//! ```

mod audit;
mod bootstrap;
mod database;
mod error;
mod general;

pub use audit::AuditConfig;
pub use bootstrap::BootstrapConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VitalisConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl VitalisConfig {
    /// Load configuration from TOML files and environment variables, then
    /// validate it.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment (tests layer their own
    /// providers on top of [`Self::figment`]).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".vitalis/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("VITALIS_").split("__"))
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.bootstrap.validate()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vitalis").join("config.toml"))
    }

    /// Walk up from `CARGO_MANIFEST_DIR` (or fall back to the current dir)
    /// looking for a `.env` file. Silently does nothing if none is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = VitalisConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.audit.mirror_enabled());
        assert_eq!(config.general.default_limit, 50);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: VitalisConfig = VitalisConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert_eq!(config.bootstrap.max_attempts, 5);
    }
}
