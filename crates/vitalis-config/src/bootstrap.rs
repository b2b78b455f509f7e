//! Schema bootstrap retry configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_max_attempts() -> u32 {
    5
}

const fn default_backoff_ms() -> u64 {
    2_000
}

const fn default_deadline_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
    /// Connection/migration attempts before giving up (including the first).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Overall bootstrap deadline, in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl BootstrapConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bootstrap.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.deadline_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bootstrap.deadline_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = BootstrapConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_ms, 2_000);
        assert_eq!(config.deadline_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = BootstrapConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
