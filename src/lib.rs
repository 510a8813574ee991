//! Resynchronizing JSON telemetry link for PeriK3 BLE sensor devices.
//!
//! The device streams JSON objects back to back over a BLE notification
//! channel, with no delimiter and no guarantee that a notification ends on a
//! frame or even a character boundary. Perilink turns that byte stream into
//! validated frames and hands them to the consumer on a throttled cadence.
//!
//! # Features
//!
//! - **Streaming UTF-8**: Characters split across notifications are carried
//!   over; invalid bytes become U+FFFD and never look like braces or quotes
//! - **Resynchronization**: Leading garbage, zombie fragments and malformed
//!   objects are dropped without stalling the stream
//! - **Bounded memory**: Text buffer and delivery queues have hard caps
//! - **Single owner**: One worker task owns all parser state; no locks
//! - **Typed decoding**: [`TelemetryFrame`], [`ProcessedResult`],
//!   [`DynamicFrame`] or any serde type through [`Json`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use futures::StreamExt;
//! use perilink::{LinkConfig, LinkSession, TelemetryFrame, Transport, UpdateRate};
//!
//! struct GattWriter;
//!
//! #[async_trait::async_trait]
//! impl Transport for GattWriter {
//!     async fn send_bytes(&self, _payload: Bytes) -> bool {
//!         true
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> perilink::Result<()> {
//!     let (session, events) = LinkSession::open(GattWriter, LinkConfig::default())?;
//!
//!     // Wire these into the BLE notification and connection callbacks
//!     let inbound = session.inbound();
//!     inbound.on_connection_state_changed(true)?;
//!     inbound.on_bytes_received(&br#"{"t":"D","s":1,"F":2.5}"#[..])?;
//!
//!     session.start_measurement().await;
//!
//!     let mut records = events.subscribe::<TelemetryFrame>(UpdateRate::Native);
//!     while let Some(record) = records.next().await {
//!         println!("{} {:?} N", record.state(), record.force);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod adapters;
pub mod config;
mod dynamic_frame;
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Parsing pipeline
pub mod codec;
pub mod delivery;
pub mod pipeline;

// Worker and consumer surface
mod driver;
pub mod session;
pub mod stream;
pub mod transport;

// Core exports
pub use adapters::*;
pub use config::{DeliveryConfig, DiagnosticsConfig, LinkConfig, ParserLimits};
pub use dynamic_frame::*;
pub use error::*;
pub use types::*;

// Main API exports
pub use codec::{CommandPacket, McuCommand};
pub use pipeline::{FramePipeline, PipelineStats};
pub use session::{InboundHandle, LinkEvents, LinkSession};
pub use transport::Transport;
