//! Dynamic key-value adapter over a telemetry frame.
//!
//! This adapter provides by-name lookups for fields without requiring a
//! bespoke typed struct. It is intended for exploration, tooling and firmware
//! revisions that add fields. For hot paths, prefer [`TelemetryFrame`] or a
//! serde type behind [`Json`](crate::Json).
//!
//! [`TelemetryFrame`]: crate::TelemetryFrame

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::adapters::FrameAdapter;
use crate::types::ValidatedFrame;
use crate::{LinkError, Result};

/// A self-contained view over a single frame supporting by-name lookups.
#[derive(Debug, Clone)]
pub struct DynamicFrame {
    fields: Arc<Map<String, Value>>,
    seq: u64,
}

impl DynamicFrame {
    /// Raw JSON value of a field.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Generic typed lookup by field name.
    /// Returns None if the field is missing or type conversion fails.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        serde_json::from_value(self.value(name)?.clone()).ok()
    }

    /// Convenience typed helpers
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.value(name)?.as_f64()
    }
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.value(name)?.as_i64()
    }
    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name)?.as_str()
    }
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name)?.as_bool()
    }

    /// Frame type tag (`t`)
    pub fn tag(&self) -> Option<&str> {
        self.str("t")
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Accessors for metadata
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl FrameAdapter for DynamicFrame {
    fn adapt(frame: &ValidatedFrame) -> Result<Self> {
        match frame.parse::<Value>()? {
            Value::Object(fields) => Ok(Self { fields: Arc::new(fields), seq: frame.seq }),
            _ => Err(LinkError::parse("Dynamic frame", "frame is not a JSON object")),
        }
    }
}
