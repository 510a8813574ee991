//! Validated frame type

use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::Result;

/// A candidate frame confirmed to be a well-formed JSON object.
///
/// This is the unit that flows from the parser to the consumer. The JSON text
/// is shared via `Arc<str>` so batches can be cloned cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFrame {
    /// Per-session sequence number, increasing in extraction order
    pub seq: u64,

    /// The frame exactly as extracted, from `{` to the matching `}`
    pub json: Arc<str>,
}

impl ValidatedFrame {
    /// Create a new validated frame
    pub fn new(seq: u64, json: impl Into<Arc<str>>) -> Self {
        Self { seq, json: json.into() }
    }

    /// The frame JSON text.
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// Deserialize the frame into any serde type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.json)?)
    }
}

impl fmt::Display for ValidatedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json)
    }
}
