//! Storage location configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_path() -> String {
    ".vitalis/records.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    /// Whether the store lives only in process memory.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_project_local() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, ".vitalis/records.db");
        assert!(!config.is_in_memory());
    }

    #[test]
    fn empty_path_is_invalid() {
        let config = DatabaseConfig { path: " ".into() };
        assert!(config.validate().is_err());
    }
}
