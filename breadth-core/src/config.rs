//! Engine configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! ttl_secs = 300
//! lookback_days = 60
//! batch_size = 100
//! min_sessions = 40
//! ema_weighting = "adjusted"
//! parallel = true
//! ```

use crate::indicators::EmaWeighting;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Longest indicator window in the pipeline (the 40-session DMA).
pub const LONGEST_LOOKBACK: usize = 40;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum age of a cached report. Zero disables caching.
    pub ttl_secs: u64,
    /// Trading days of history requested from the price provider.
    pub lookback_days: u32,
    /// Symbols per provider batch.
    pub batch_size: usize,
    /// Valid sessions an instrument needs before it is classified.
    pub min_sessions: usize,
    /// Seeding of the 5- and 20-span EMAs.
    pub ema_weighting: EmaWeighting,
    /// Run the per-instrument pipeline on the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            lookback_days: 60,
            batch_size: 100,
            min_sessions: LONGEST_LOOKBACK,
            ema_weighting: EmaWeighting::Adjusted,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sessions < LONGEST_LOOKBACK {
            return Err(ConfigError::Invalid(format!(
                "min_sessions must be >= {LONGEST_LOOKBACK}, got {}",
                self.min_sessions
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be >= 1".into()));
        }
        if (self.lookback_days as usize) < self.min_sessions {
            return Err(ConfigError::Invalid(format!(
                "lookback_days ({}) cannot cover min_sessions ({})",
                self.lookback_days, self.min_sessions
            )));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
