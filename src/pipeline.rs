//! Synchronous parsing pipeline.
//!
//! [`FramePipeline`] chains decoder, extractor, validator and delivery
//! queues. It holds all mutable parser state and is owned by exactly one
//! worker, so none of it is locked.

use tracing::{debug, trace, warn};

use crate::codec::{FrameExtractor, ScanEvent, Utf8StreamDecoder, validate};
use crate::config::LinkConfig;
use crate::delivery::{DeliveryQueues, DeliveryStats, FlushBatch};

/// Counters over the lifetime of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub chunks: u64,
    pub bytes: u64,

    /// Invalid UTF-8 sequences replaced during decoding
    pub replaced_sequences: u64,

    pub frames_validated: u64,
    pub frames_rejected: u64,
    pub garbage_bytes_skipped: u64,
    pub zombies_dropped: u64,

    /// Bytes lost to buffer cap and no-brace trims
    pub bytes_trimmed: u64,

    pub delivery: DeliveryStats,
}

/// Bytes in, batches out.
#[derive(Debug)]
pub struct FramePipeline {
    decoder: Utf8StreamDecoder,
    extractor: FrameExtractor,
    queues: DeliveryQueues,
    next_seq: u64,
    stats: PipelineStats,
}

impl FramePipeline {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            decoder: Utf8StreamDecoder::new(),
            extractor: FrameExtractor::new(config.parser.clone()),
            queues: DeliveryQueues::new(config),
            next_seq: 0,
            stats: PipelineStats::default(),
        }
    }

    /// Decode one chunk and extract whatever frames it completes.
    pub fn ingest(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;

        let decoded = self.decoder.decode(chunk);
        if decoded.replaced > 0 {
            self.stats.replaced_sequences += decoded.replaced as u64;
            debug!(replaced = decoded.replaced, chunk_len = chunk.len(), "Replaced invalid UTF-8 sequences");
        }
        if decoded.text.is_empty() {
            return;
        }

        self.queues.push_raw(&decoded.text);

        if let Some(dropped) = self.extractor.push_str(&decoded.text) {
            self.stats.bytes_trimmed += dropped as u64;
            warn!(dropped, "RX buffer trimmed (too large)");
            self.queues.push_log(format!("RX buffer trimmed (too large): dropped {} bytes", dropped));
        }

        self.pump();
    }

    /// Run the extractor until it stalls or spends its step budget.
    /// Returns the number of frames validated.
    pub fn pump(&mut self) -> usize {
        let Self { extractor, queues, next_seq, stats, .. } = self;
        let mut validated = 0;

        for event in extractor.drain() {
            match event {
                ScanEvent::Candidate(candidate) => match validate(candidate, *next_seq) {
                    Ok(frame) => {
                        trace!(seq = frame.seq, len = frame.json.len(), "JSON OK");
                        *next_seq += 1;
                        stats.frames_validated += 1;
                        validated += 1;
                        queues.push_frame(frame);
                    }
                    Err(rejection) => {
                        stats.frames_rejected += 1;
                        warn!(reason = %rejection.reason, "Broken JSON skipped: {}", rejection.preview);
                        queues.push_log(format!("Broken JSON skipped: {}", rejection.preview));
                    }
                },
                ScanEvent::GarbageSkipped { len } => {
                    stats.garbage_bytes_skipped += len as u64;
                    trace!(len, "Skipped bytes before frame start");
                }
                ScanEvent::ZombieDropped { buffered } => {
                    stats.zombies_dropped += 1;
                    warn!(buffered, "JSON too long or corrupted, dropping '{{' to resync");
                    queues.push_log(format!(
                        "JSON too long/corrupted ({} bytes buffered), dropped '{{' and resynced",
                        buffered
                    ));
                }
                ScanEvent::GarbageTrimmed { dropped } => {
                    stats.bytes_trimmed += dropped as u64;
                    warn!(dropped, "Garbage trimmed (no '{{' found)");
                    queues.push_log(format!("Garbage trimmed (no '{{' found): dropped {} bytes", dropped));
                }
            }
        }

        if extractor.has_backlog() {
            debug!(buffered = extractor.buffered_len(), "Scan step budget spent, resuming next tick");
        }

        validated
    }

    /// Queue a diagnostic line for the consumer.
    pub fn log(&mut self, message: impl Into<String>) {
        self.queues.push_log(message);
    }

    /// Number of events the next flush would produce.
    pub fn pending_events(&self) -> usize {
        self.queues.pending_events()
    }

    pub fn flush(&mut self) -> Option<FlushBatch> {
        self.queues.flush()
    }

    /// Forget all stream state: decoder carry, buffered text, queued frames
    /// and raw-dump lines. Queued log lines and sequence numbers survive.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.extractor.clear();
        self.queues.clear_stream();
    }

    pub fn has_backlog(&self) -> bool {
        self.extractor.has_backlog()
    }

    pub fn buffered_len(&self) -> usize {
        self.extractor.buffered_len()
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats { delivery: self.queues.stats(), ..self.stats }
    }
}
