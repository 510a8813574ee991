//! Core types for the telemetry link.
//!
//! ## Architecture
//!
//! - [`ValidatedFrame`] is a complete JSON object extracted from the byte stream
//! - [`LinkEvent`] is the single ordered stream of everything the consumer sees
//! - [`TelemetryFrame`] and [`ProcessedResult`] are typed decodings of frames
//! - [`DeliveryPolicy`] and [`UpdateRate`] control how often frames surface
//!
//! ## Usage Example
//!
//! ```rust
//! use perilink::types::{MeasurementState, TelemetryFrame, ValidatedFrame};
//!
//! let frame = ValidatedFrame::new(0, r#"{"t":"D","s":2,"F":1.5}"#);
//! let record = TelemetryFrame::from_frame(&frame).unwrap();
//!
//! assert_eq!(record.state(), MeasurementState::Tremor);
//! assert_eq!(record.force, Some(1.5));
//! ```

mod event;
mod frame;
mod telemetry;
mod update_rate;

pub use event::{LinkEvent, LogLine};
pub(crate) use event::truncate_chars;
pub use frame::ValidatedFrame;
pub use telemetry::{
    DATA_FRAME_TAG, MeasurementState, PROCESSED_FRAME_TAG, ProcessedResult, TelemetryFrame,
};
pub use update_rate::{DeliveryPolicy, UpdateRate};
