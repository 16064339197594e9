use super::backoff::Backoff;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Live feed connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint (ws:// or wss://)
    #[serde(default = "default_url")]
    pub url: String,

    /// Reconnect automatically after the connection closes
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// First reconnect delay; doubles per consecutive close (0 is raised to 1 ms)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the reconnect delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_url() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl FeedConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            auto_reconnect: default_auto_reconnect(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}
