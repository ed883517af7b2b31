//! Trade event publisher configuration.

use serde::{Deserialize, Serialize};

use super::defaults::default_true;

/// Kafka REST proxy publisher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Publish trade events. When false, events are discarded.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the Kafka REST proxy.
    #[serde(default)]
    pub broker_url: String,
    /// Destination topic.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Per-publish timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Events buffered before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            broker_url: String::new(),
            topic: default_topic(),
            timeout_ms: default_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_topic() -> String {
    "trades".to_string()
}

const fn default_timeout_ms() -> u64 {
    5_000
}

const fn default_queue_capacity() -> usize {
    1_024
}
