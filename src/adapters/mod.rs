//! Typed adapters for consumer-side frame decoding.
//!
//! Every delivered frame is a validated JSON object. Adapters turn it into
//! whatever the consumer works with:
//! - [`TelemetryFrame`](crate::TelemetryFrame) for `"D"` data frames
//! - [`ProcessedResult`](crate::ProcessedResult) for `"P"` analysis results
//! - [`DynamicFrame`](crate::DynamicFrame) for by-name lookups
//! - [`Json`] for any serde type
//!
//! # Example Usage
//!
//! ```rust
//! use perilink::{FrameAdapter, LinkError, Result, ValidatedFrame};
//!
//! struct PressEvent {
//!     force: f64,
//! }
//!
//! impl FrameAdapter for PressEvent {
//!     fn adapt(frame: &ValidatedFrame) -> Result<Self> {
//!         let value: serde_json::Value = frame.parse()?;
//!         let force = value["F"].as_f64().ok_or_else(|| LinkError::missing_field("F"))?;
//!         Ok(Self { force })
//!     }
//! }
//!
//! let frame = ValidatedFrame::new(0, r#"{"t":"D","s":3,"F":8.25}"#);
//! assert_eq!(PressEvent::adapt(&frame).unwrap().force, 8.25);
//! ```

mod frame_adapter;

pub use frame_adapter::{FrameAdapter, Json};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinkError, ProcessedResult, TelemetryFrame, ValidatedFrame};
    use serde::Deserialize;

    #[test]
    fn builtin_adapters() {
        let data = ValidatedFrame::new(1, r#"{"t":"D","F":2.0}"#);
        let processed = ValidatedFrame::new(2, r#"{"t":"P","e":0.5}"#);

        assert_eq!(TelemetryFrame::adapt(&data).unwrap().force, Some(2.0));
        assert_eq!(ProcessedResult::adapt(&processed).unwrap().elastic_energy, Some(0.5));
        assert!(ProcessedResult::adapt(&data).is_err());
        assert_eq!(ValidatedFrame::adapt(&data).unwrap(), data);
    }

    #[test]
    fn json_adapter_reports_mismatch() {
        #[derive(Debug, Deserialize)]
        struct NeedsRotation {
            #[allow(dead_code)]
            r: f64,
        }

        let frame = ValidatedFrame::new(0, r#"{"t":"D"}"#);
        let result = Json::<NeedsRotation>::adapt(&frame);
        assert!(matches!(result, Err(LinkError::Parse { .. })));
    }
}
