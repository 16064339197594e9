use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the startup snapshot source
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Vehicle snapshot file (.json or .json.gz). Without one the fleet
    /// starts empty and every update is discarded.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Reload the snapshot on this interval (seconds); unset or 0 loads once
    #[serde(default)]
    pub refresh_interval_seconds: Option<u64>,
}

impl SnapshotConfig {
    /// Refresh period, or None when periodic reload is off
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_seconds
            .filter(|&seconds| seconds > 0)
            .map(Duration::from_secs)
    }
}
