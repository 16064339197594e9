use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

// Re-export section config types
pub use crate::feed::FeedConfig;
pub use crate::snapshot::config::SnapshotConfig;

/// Environment variable overriding `feed.url`
pub const ENV_FEED_URL: &str = "FLEETWATCH_FEED_URL";

/// Environment variable overriding `snapshot.path`
pub const ENV_SNAPSHOT_PATH: &str = "FLEETWATCH_SNAPSHOT_PATH";

/// Complete fleetwatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Periodic fleet summary logging
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// How often to log fleet metrics (seconds); 0 disables
    #[serde(default = "default_log_interval")]
    pub log_interval_seconds: u64,
}

fn default_log_interval() -> u64 {
    30
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            log_interval_seconds: default_log_interval(),
        }
    }
}

impl FleetConfig {
    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_FEED_URL).filter(|v| !v.is_empty()) {
            self.feed.url = url;
        }
        if let Some(path) = lookup(ENV_SNAPSHOT_PATH).filter(|v| !v.is_empty()) {
            self.snapshot.path = Some(PathBuf::from(path));
        }
        self
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<FleetConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: FleetConfig = toml::from_str(&contents).context("Failed to parse config TOML")?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
