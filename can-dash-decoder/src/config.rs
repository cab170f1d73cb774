//! Ingest loop configuration
//!
//! The minimal knobs the library needs to drive a frame source. Application
//! concerns (simulator dynamics, HTTP address, log file path) live in the CLI.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the ingest loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Delay after each dispatched frame in milliseconds (0 = no delay)
    #[serde(default)]
    pub frame_interval_ms: u64,

    /// Optional: stop after this many frames
    #[serde(default)]
    pub max_frames: Option<usize>,

    /// Optional: only dispatch these CAN IDs
    #[serde(default)]
    pub message_filter: Option<Vec<u32>>,
}

impl IngestConfig {
    /// Create a new ingest configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the inter-frame delay
    pub fn with_frame_interval_ms(mut self, interval_ms: u64) -> Self {
        self.frame_interval_ms = interval_ms;
        self
    }

    /// Builder method: limit the number of frames
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Builder method: set message filter
    pub fn with_message_filter(mut self, messages: Vec<u32>) -> Self {
        self.message_filter = Some(messages);
        self
    }

    /// Inter-frame delay, if any
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.frame_interval_ms > 0).then(|| Duration::from_millis(self.frame_interval_ms))
    }

    /// Check if a message ID should be dispatched
    pub fn should_process_message(&self, can_id: u32) -> bool {
        match &self.message_filter {
            Some(messages) => messages.contains(&can_id),
            None => true,
        }
    }

    /// Check if the frame limit has been reached
    pub fn limit_reached(&self, frames_seen: usize) -> bool {
        matches!(self.max_frames, Some(max) if frames_seen >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_config_builder() {
        let config = IngestConfig::new()
            .with_frame_interval_ms(100)
            .with_max_frames(25)
            .with_message_filter(vec![0x101, 0x102]);

        assert_eq!(config.frame_interval(), Some(Duration::from_millis(100)));
        assert_eq!(config.max_frames, Some(25));
        assert!(config.should_process_message(0x101));
        assert!(!config.should_process_message(0x105));
    }

    #[test]
    fn test_no_limits() {
        let config = IngestConfig::new();

        assert_eq!(config.frame_interval(), None);
        assert!(config.should_process_message(0x7FF));
        assert!(!config.limit_reached(usize::MAX));
    }

    #[test]
    fn test_limit_reached() {
        let config = IngestConfig::new().with_max_frames(5);
        assert!(!config.limit_reached(4));
        assert!(config.limit_reached(5));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: IngestConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.frame_interval_ms, 0);
        assert!(config.max_frames.is_none());
        assert!(config.message_filter.is_none());
    }
}
