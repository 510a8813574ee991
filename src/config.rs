//! Link configuration.
//!
//! Every tunable of the parsing pipeline and the delivery throttle lives here.
//! Configurations deserialize from YAML with per-field defaults, so a file only
//! needs the values it overrides:
//!
//! ```rust
//! use perilink::{DeliveryPolicy, LinkConfig};
//!
//! let config = LinkConfig::from_yaml_str(
//!     "delivery:\n  flush_interval_ms: 100\n  policy: latest\n",
//! )
//! .unwrap();
//!
//! assert_eq!(config.delivery.policy, DeliveryPolicy::Latest);
//! assert_eq!(config.parser.max_frame_len, 4096);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::types::DeliveryPolicy;
use crate::{LinkError, Result};

/// Lower bound applied to the flush cadence.
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(20);

/// Smallest consumer channel that fits one full flush batch.
pub const MIN_EVENT_CHANNEL_CAPACITY: usize = 3;

/// Top-level configuration for a link session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub parser: ParserLimits,
    pub delivery: DeliveryConfig,
    pub diagnostics: DiagnosticsConfig,
}

/// Bounds for the frame extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserLimits {
    /// Longest candidate frame before it is treated as a zombie
    pub max_frame_len: usize,
    /// Hard cap on buffered text
    pub max_buffer_len: usize,
    /// Tail kept when the buffer is trimmed
    pub keep_tail_len: usize,
    /// Scan steps allowed per ingested chunk
    pub max_steps_per_call: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_frame_len: 4096,
            max_buffer_len: 256 * 1024,
            keep_tail_len: 64 * 1024,
            max_steps_per_call: 500,
        }
    }
}

/// Throttled delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub flush_interval_ms: u64,
    pub policy: DeliveryPolicy,
    /// Cap on frames handed over per tick under [`DeliveryPolicy::All`]
    pub max_frames_per_flush: Option<usize>,
    pub frame_queue_capacity: usize,
    pub log_queue_capacity: usize,
    /// Characters kept per log line before truncation
    pub max_log_line_len: usize,
    /// Batches buffered between the worker and the consumer
    pub event_channel_capacity: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 20,
            policy: DeliveryPolicy::All,
            max_frames_per_flush: None,
            frame_queue_capacity: 500,
            log_queue_capacity: 200,
            max_log_line_len: 250,
            event_channel_capacity: 64,
        }
    }
}

impl DeliveryConfig {
    /// Flush cadence with [`MIN_FLUSH_INTERVAL`] applied.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms).max(MIN_FLUSH_INTERVAL)
    }
}

/// Raw receive dump, off by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub raw_dump: bool,
    pub raw_dump_line_len: usize,
    pub raw_dump_capacity: usize,
    pub raw_dump_lines_per_flush: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            raw_dump: false,
            raw_dump_line_len: 800,
            raw_dump_capacity: 300,
            raw_dump_lines_per_flush: 30,
        }
    }
}

impl LinkConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|err| LinkError::file_error(path.to_path_buf(), err))?;
        debug!("Loaded link configuration from {}", path.display());
        Self::from_yaml_str(&yaml)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        let parser = &self.parser;
        let delivery = &self.delivery;
        let diagnostics = &self.diagnostics;

        let non_zero = [
            ("parser.max_frame_len", parser.max_frame_len),
            ("parser.max_buffer_len", parser.max_buffer_len),
            ("parser.keep_tail_len", parser.keep_tail_len),
            ("parser.max_steps_per_call", parser.max_steps_per_call),
            ("delivery.frame_queue_capacity", delivery.frame_queue_capacity),
            ("delivery.log_queue_capacity", delivery.log_queue_capacity),
            ("delivery.max_log_line_len", delivery.max_log_line_len),
            ("delivery.event_channel_capacity", delivery.event_channel_capacity),
            ("diagnostics.raw_dump_line_len", diagnostics.raw_dump_line_len),
            ("diagnostics.raw_dump_capacity", diagnostics.raw_dump_capacity),
            ("diagnostics.raw_dump_lines_per_flush", diagnostics.raw_dump_lines_per_flush),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(LinkError::config(format!("{} must be greater than zero", name)));
        }

        // One flush can emit a log, a raw-dump and a frame event at once
        if delivery.event_channel_capacity < MIN_EVENT_CHANNEL_CAPACITY {
            return Err(LinkError::config(format!(
                "delivery.event_channel_capacity ({}) must be at least {}",
                delivery.event_channel_capacity, MIN_EVENT_CHANNEL_CAPACITY
            )));
        }

        if delivery.max_frames_per_flush == Some(0) {
            return Err(LinkError::config("delivery.max_frames_per_flush must be greater than zero"));
        }

        if parser.keep_tail_len > parser.max_buffer_len {
            return Err(LinkError::config(format!(
                "parser.keep_tail_len ({}) exceeds parser.max_buffer_len ({})",
                parser.keep_tail_len, parser.max_buffer_len
            )));
        }

        if parser.max_frame_len >= parser.max_buffer_len {
            return Err(LinkError::config(format!(
                "parser.max_frame_len ({}) must be below parser.max_buffer_len ({})",
                parser.max_frame_len, parser.max_buffer_len
            )));
        }

        Ok(())
    }
}
