//! Test utilities: a recording transport and sample telemetry streams
//!
//! Shared by unit tests and benchmarks (enable the `benchmark` feature).

#![cfg(any(test, feature = "benchmark"))]

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::Transport;

/// BLE notification payload size used by the device (MTU 247 minus ATT header)
pub const NOTIFICATION_SIZE: usize = 244;

/// Transport that records every write and accepts or refuses on demand.
#[derive(Debug)]
pub struct MockTransport {
    sent: Mutex<Vec<Bytes>>,
    accept: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self { sent: Mutex::new(Vec::new()), accept: AtomicBool::new(true) }
    }

    /// A transport that refuses every write, as when no GATT link exists.
    pub fn refusing() -> Self {
        let transport = Self::new();
        transport.set_accept(false);
        transport
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    /// Payloads written so far, including refused ones.
    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn sent_text(&self) -> Vec<String> {
        self.sent().iter().map(|payload| String::from_utf8_lossy(payload).into_owned()).collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send_bytes(&self, payload: Bytes) -> bool {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(payload);
        self.accept.load(Ordering::SeqCst)
    }
}

/// A `"D"` frame as the device formats it.
pub fn data_frame(ts: i64, state: i32) -> String {
    let phase = ts as f64 / 100.0;
    format!(
        r#"{{"t":"D","ts":{},"s":{},"F":{:.3},"x":{:.3},"TF":0,"TI":0.000,"LV":0.000,"LD":0.000,"px":{:.3},"py":{:.3},"r":{:.1}}}"#,
        ts,
        state,
        4.0 + phase.sin(),
        1.5 + phase.cos() * 0.5,
        phase.sin() * 0.1,
        phase.cos() * 0.1,
        (ts % 360) as f64
    )
}

/// A `"P"` frame closing a press analysis.
pub fn processed_frame(duration_ms: i64) -> String {
    format!(
        r#"{{"t":"P","e":0.004512,"fmax":2.750,"xmax":3.100,"r2":0.987,"dur":{}}}"#,
        duration_ms
    )
}

/// `count` back-to-back data frames with no delimiter.
pub fn frame_stream(count: usize) -> String {
    (0..count).map(|index| data_frame(index as i64 * 10, (index % 6) as i32)).collect()
}

/// A stream with periodic corruption: stray bytes, a truncated frame and a
/// frame that is balanced but malformed. Every fourth data frame is intact.
pub fn corrupted_stream(count: usize) -> String {
    let mut stream = String::new();
    for index in 0..count {
        match index % 4 {
            0 => stream.push_str(&data_frame(index as i64, 1)),
            1 => stream.push_str("\u{FFFD}\u{FFFD}~OK\r\n"),
            2 => {
                let frame = data_frame(index as i64, 2);
                stream.push_str(&frame[..frame.len() / 2]);
            }
            _ => stream.push_str(r#"{"t":"D","F":}"#),
        }
    }
    stream
}

/// Split a stream into notification-sized chunks, ignoring char boundaries.
pub fn notification_chunks(stream: &str, size: usize) -> Vec<Bytes> {
    stream.as_bytes().chunks(size.max(1)).map(Bytes::copy_from_slice).collect()
}
