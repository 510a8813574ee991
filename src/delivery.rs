//! Throttled delivery queues.
//!
//! Validated frames, log lines and raw-dump lines collect in bounded
//! drop-oldest queues between flush ticks. Each tick drains them into one
//! [`FlushBatch`] under the configured [`DeliveryPolicy`].

use std::collections::VecDeque;

use crate::config::LinkConfig;
use crate::types::{DeliveryPolicy, LinkEvent, LogLine, ValidatedFrame, truncate_chars};

/// FIFO with a fixed capacity that evicts its oldest entry when full.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    dropped: u64,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self { items: VecDeque::with_capacity(capacity.min(1024)), capacity: capacity.max(1), dropped: 0 }
    }

    /// Append `item`, returning `true` if the oldest entry was evicted.
    pub fn push(&mut self, item: T) -> bool {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front();
            self.dropped += 1;
            true
        } else {
            false
        };
        self.items.push_back(item);
        evicted
    }

    /// Remove up to `max` entries from the front.
    pub fn drain_up_to(&mut self, max: usize) -> Vec<T> {
        let count = self.items.len().min(max);
        self.items.drain(..count).collect()
    }

    pub fn drain_all(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Keep only the newest entry and return it. Returns the entry and the
    /// number of older entries discarded.
    pub fn take_latest(&mut self) -> Option<(T, usize)> {
        let latest = self.items.pop_back()?;
        let discarded = self.items.len();
        self.items.clear();
        Some((latest, discarded))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Everything drained on one flush tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushBatch {
    pub logs: Vec<LogLine>,
    pub raw_dump: Vec<String>,
    pub frames: Vec<ValidatedFrame>,
}

impl FlushBatch {
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.raw_dump.is_empty() && self.frames.is_empty()
    }

    /// Events in dispatch order: logs, raw dump, frames. Empty parts are skipped.
    pub fn into_events(self) -> Vec<LinkEvent> {
        let mut events = Vec::with_capacity(3);
        if !self.logs.is_empty() {
            events.push(LinkEvent::Logs(self.logs));
        }
        if !self.raw_dump.is_empty() {
            events.push(LinkEvent::RawDump(self.raw_dump));
        }
        if !self.frames.is_empty() {
            events.push(LinkEvent::Frames(self.frames));
        }
        events
    }
}

/// Queue depths and loss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub frames_queued: usize,
    pub logs_queued: usize,
    pub raw_queued: usize,

    /// Frames evicted by queue overflow
    pub frames_dropped: u64,
    pub logs_dropped: u64,
    pub raw_dropped: u64,

    /// Frames discarded by [`DeliveryPolicy::Latest`]
    pub frames_coalesced: u64,
}

/// The three delivery queues and their flush policy.
#[derive(Debug)]
pub struct DeliveryQueues {
    frames: BoundedQueue<ValidatedFrame>,
    logs: BoundedQueue<LogLine>,
    raw_dump: BoundedQueue<String>,

    policy: DeliveryPolicy,
    max_frames_per_flush: Option<usize>,
    max_log_line_len: usize,

    /// `None` when raw dumps are disabled
    raw_dump_line_len: Option<usize>,
    raw_dump_lines_per_flush: usize,

    frames_coalesced: u64,
}

impl DeliveryQueues {
    pub fn new(config: &LinkConfig) -> Self {
        let delivery = &config.delivery;
        let diagnostics = &config.diagnostics;

        Self {
            frames: BoundedQueue::new(delivery.frame_queue_capacity),
            logs: BoundedQueue::new(delivery.log_queue_capacity),
            raw_dump: BoundedQueue::new(diagnostics.raw_dump_capacity),
            policy: delivery.policy,
            max_frames_per_flush: delivery.max_frames_per_flush,
            max_log_line_len: delivery.max_log_line_len,
            raw_dump_line_len: diagnostics.raw_dump.then_some(diagnostics.raw_dump_line_len),
            raw_dump_lines_per_flush: diagnostics.raw_dump_lines_per_flush,
            frames_coalesced: 0,
        }
    }

    pub fn push_frame(&mut self, frame: ValidatedFrame) -> bool {
        self.frames.push(frame)
    }

    pub fn push_log(&mut self, message: impl Into<String>) {
        self.logs.push(LogLine::truncated(message, self.max_log_line_len));
    }

    /// Record a decoded chunk for the raw dump. No-op unless raw dumps are enabled.
    pub fn push_raw(&mut self, chunk: &str) {
        if let Some(max_chars) = self.raw_dump_line_len {
            self.raw_dump.push(truncate_chars(chunk.to_string(), max_chars));
        }
    }

    pub fn raw_dump_enabled(&self) -> bool {
        self.raw_dump_line_len.is_some()
    }

    /// Events the next [`flush`](Self::flush) would produce: one each for
    /// non-empty log, raw-dump and frame queues.
    pub fn pending_events(&self) -> usize {
        [!self.logs.is_empty(), !self.raw_dump.is_empty(), !self.frames.is_empty()]
            .into_iter()
            .filter(|pending| *pending)
            .count()
    }

    /// Drain the queues for one tick. Returns `None` when there is nothing
    /// to deliver.
    pub fn flush(&mut self) -> Option<FlushBatch> {
        let logs = self.logs.drain_all();
        let raw_dump = self.raw_dump.drain_up_to(self.raw_dump_lines_per_flush);

        let frames = match self.policy {
            DeliveryPolicy::All => match self.max_frames_per_flush {
                Some(max) => self.frames.drain_up_to(max),
                None => self.frames.drain_all(),
            },
            DeliveryPolicy::Latest => match self.frames.take_latest() {
                Some((latest, discarded)) => {
                    self.frames_coalesced += discarded as u64;
                    vec![latest]
                }
                None => Vec::new(),
            },
        };

        let batch = FlushBatch { logs, raw_dump, frames };
        (!batch.is_empty()).then_some(batch)
    }

    /// Drop queued frames and raw-dump lines. Log lines are kept.
    pub fn clear_stream(&mut self) {
        self.frames.clear();
        self.raw_dump.clear();
    }

    pub fn clear(&mut self) {
        self.clear_stream();
        self.logs.clear();
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            frames_queued: self.frames.len(),
            logs_queued: self.logs.len(),
            raw_queued: self.raw_dump.len(),
            frames_dropped: self.frames.dropped(),
            logs_dropped: self.logs.dropped(),
            raw_dropped: self.raw_dump.dropped(),
            frames_coalesced: self.frames_coalesced,
        }
    }
}
