//! Consumer-facing events and diagnostic lines

use serde::Serialize;
use std::fmt;

use super::ValidatedFrame;

/// One ordered event stream replaces separate log, connection and frame
/// callbacks.
///
/// Within one flush tick the driver emits `Logs`, then `RawDump`, then
/// `Frames`, skipping any that would be empty.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Transport connection state changed (`true` = connected)
    Connection(bool),

    /// Diagnostic lines queued since the previous tick
    Logs(Vec<LogLine>),

    /// Truncated copies of decoded receive chunks (diagnostics only)
    RawDump(Vec<String>),

    /// Validated frames in extraction order
    Frames(Vec<ValidatedFrame>),
}

impl LinkEvent {
    /// Frames carried by this event, if any.
    pub fn frames(&self) -> &[ValidatedFrame] {
        match self {
            LinkEvent::Frames(frames) => frames,
            _ => &[],
        }
    }
}

/// A short human-readable diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LogLine(String);

impl LogLine {
    /// Build a line, keeping at most `max_chars` characters of `message`.
    ///
    /// Truncated lines end with `...`.
    pub fn truncated(message: impl Into<String>, max_chars: usize) -> Self {
        Self(truncate_chars(message.into(), max_chars))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render a batch in the device log envelope:
    /// `{"type":"BLE_LOG","count":N,"logs":[...]}`.
    pub fn batch_json(lines: &[LogLine]) -> String {
        #[derive(Serialize)]
        struct LogBatch<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            count: usize,
            logs: &'a [LogLine],
        }

        let batch = LogBatch { kind: "BLE_LOG", count: lines.len(), logs: lines };
        // Serializing strings into a String cannot fail
        serde_json::to_string(&batch).unwrap_or_default()
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keep the first `max_chars` characters, appending `...` when anything was cut.
pub(crate) fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max_chars) {
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
