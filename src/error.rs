//! Error types for the telemetry link.
//!
//! Data faults on the wire (corrupted bytes, truncated frames, malformed JSON)
//! are never reported through this type. The pipeline recovers from those by
//! dropping data and emitting diagnostics. `LinkError` covers the API surface:
//! configuration, consumer-side frame decoding and session lifecycle.
//!
//! ## Error Categories
//!
//! - **Config Errors**: Invalid or unreadable link configuration
//! - **Parse Errors**: A validated frame could not be decoded into a typed record
//! - **Missing Field Errors**: A frame lacks a field its record type requires
//! - **Session Errors**: The link session has already been stopped
//!
//! Transport write failures are not errors either: [`crate::Transport`]
//! reports them as `false` and the session logs them.
//!
//! ## Recovery
//!
//! ```rust
//! use perilink::LinkError;
//!
//! let error = LinkError::config("parser.max_frame_len must be greater than zero");
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for link operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Invalid link configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Field '{field}' missing from telemetry frame")]
    MissingField { field: String },

    #[error("Link session is closed")]
    SessionClosed,
}

impl LinkError {
    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            LinkError::Config { .. } => vec![
                "Check that every limit is greater than zero",
                "Keep keep_tail_len at or below max_buffer_len",
                "Keep max_frame_len below max_buffer_len",
            ],
            LinkError::File { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
            LinkError::Parse { .. } => vec![
                "Check device firmware frame format",
                "Verify the frame type tag matches the decoded record",
            ],
            LinkError::MissingField { .. } => vec![
                "Check the device emits the required field",
                "Decode into DynamicFrame for partial frames",
            ],
            LinkError::SessionClosed => vec![
                "Open a new link session",
                "Stop forwarding transport callbacks after stopping the session",
            ],
        }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        LinkError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        LinkError::File { path, source }
    }

    /// Helper constructor for frame decoding errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        LinkError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for missing field errors.
    pub fn missing_field(field: impl Into<String>) -> Self {
        LinkError::MissingField { field: field.into() }
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(err: serde_json::Error) -> Self {
        LinkError::Parse { context: "JSON frame".to_string(), details: err.to_string() }
    }
}

impl From<serde_yaml_ng::Error> for LinkError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        LinkError::Parse { context: "YAML configuration".to_string(), details: err.to_string() }
    }
}
