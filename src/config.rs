//! Player configuration.

use crate::error::{LyricSyncError, Result};
use crate::player::DEFAULT_TICK_INTERVAL_MILLIS;
use serde::{Deserialize, Serialize};

/// Deserializable knobs for [`crate::LyricsPlayer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Interval between position updates while playing, in milliseconds.
    pub tick_interval_millis: i64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_millis: DEFAULT_TICK_INTERVAL_MILLIS,
        }
    }
}

impl PlayerConfig {
    /// Check the configured values.
    ///
    /// # Errors
    ///
    /// Returns [`LyricSyncError::InvalidTickInterval`] when the tick interval
    /// is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_millis <= 0 {
            return Err(LyricSyncError::InvalidTickInterval {
                millis: self.tick_interval_millis,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert_eq!(config.tick_interval_millis, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_interval() {
        for millis in [0, -1, -500] {
            let config = PlayerConfig {
                tick_interval_millis: millis,
            };
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_deserialize_from_toml() {
        let config: PlayerConfig = toml::from_str("tick_interval_millis = 25").unwrap();
        assert_eq!(config.tick_interval_millis, 25);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: PlayerConfig = toml::from_str("").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }
}
