//! Capture session configuration
//!
//! The library only needs timing and filtering knobs. Transport setup (device
//! path, baud rate) belongs to whoever opens the byte source.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Timeout for one 11-byte read attempt (default: 200ms)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,

    /// Pause after a read that returned nothing (default: 10ms)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Optional: stop after this many frames
    #[serde(default)]
    pub max_frames: Option<usize>,

    /// Optional: only keep frames with these identifiers
    #[serde(default)]
    pub id_filter: Option<Vec<u16>>,
}

fn default_read_timeout() -> u64 {
    200
}

fn default_retry_delay() -> u64 {
    10
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout(),
            retry_delay_ms: default_retry_delay(),
            max_frames: None,
            id_filter: None,
        }
    }
}

impl CaptureConfig {
    /// Create a new capture configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the per-read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder method: set the pause after an empty read
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builder method: stop after `count` frames
    pub fn with_max_frames(mut self, count: usize) -> Self {
        self.max_frames = Some(count);
        self
    }

    /// Builder method: set identifier filter
    pub fn with_id_filter(mut self, ids: Vec<u16>) -> Self {
        self.id_filter = Some(ids);
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Check if a frame with this identifier should be kept
    pub fn should_keep(&self, id: u16) -> bool {
        match &self.id_filter {
            Some(ids) => ids.contains(&id),
            None => true,
        }
    }
}
