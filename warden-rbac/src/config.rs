//! Configuration types for the Warden engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use warden_core::{Error, Result};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Log every authorization decision with its subject and outcome.
    pub audit_enabled: bool,
    /// Cache settings.
    pub cache: CacheConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            cache: CacheConfig::default(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL in seconds for transient entries. Resolved permission sets are
    /// stored without TTL; their correctness rests on invalidation.
    pub ttl_seconds: u64,
    /// Maximum entries held by the in-process store.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            max_entries: 10_000,
        }
    }
}

impl WardenConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Failed to read config file: {e}"))
        })?;

        let config: WardenConfig = serde_json::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| Error::configuration(format!("Failed to write config file: {e}")))?;
        Ok(())
    }

    /// The TTL for transient cache entries as a [`Duration`].
    pub fn transient_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_seconds == 0 {
            return Err(Error::configuration("cache.ttl_seconds must be positive"));
        }
        if self.cache.max_entries == 0 {
            return Err(Error::configuration("cache.max_entries must be positive"));
        }
        Ok(())
    }
}
