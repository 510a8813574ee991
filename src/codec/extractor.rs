//! Resynchronizing frame extractor.
//!
//! Frames arrive back to back with no delimiter, so boundaries are found
//! purely by brace matching. The extractor keeps a bounded text buffer and
//! cuts balanced `{...}` objects off its head, honoring string and escape
//! context so braces inside string values are not structural.
//!
//! Corruption is recovered from locally:
//! - text before the first `{` is discarded
//! - a `{` with no matching `}` within `max_frame_len` is a zombie, and only
//!   that one `{` is dropped before scanning again
//! - a buffer with no `{` at all is trimmed to its tail
//!
//! Each of these paths removes at least one byte, so every scan step makes
//! progress. Work per [`FrameExtractor::drain`] is capped at
//! `max_steps_per_call` steps; an unfinished scan is reported through
//! [`FrameExtractor::has_backlog`].
//!
//! ```rust
//! use perilink::codec::{FrameExtractor, ScanEvent};
//! use perilink::ParserLimits;
//!
//! let mut extractor = FrameExtractor::new(ParserLimits::default());
//! extractor.push_str(r#"noise{"t":"D","s":1}{"t":"D","#);
//!
//! let events: Vec<ScanEvent> = extractor.drain().collect();
//! assert_eq!(
//!     events,
//!     vec![
//!         ScanEvent::GarbageSkipped { len: 5 },
//!         ScanEvent::Candidate(r#"{"t":"D","s":1}"#.to_string()),
//!     ]
//! );
//! assert_eq!(extractor.buffered(), r#"{"t":"D","#);
//! ```

use crate::config::ParserLimits;

/// Outcome of one scan step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A balanced object, from its `{` to the matching `}`
    Candidate(String),

    /// Bytes before the first `{` were discarded
    GarbageSkipped { len: usize },

    /// An unterminated `{` was dropped to resynchronize
    ZombieDropped { buffered: usize },

    /// No `{` was buffered and the buffer was cut to its tail
    GarbageTrimmed { dropped: usize },
}

/// Bounded text buffer with brace-matching frame extraction.
#[derive(Debug)]
pub struct FrameExtractor {
    buffer: String,

    /// Start of live text in `buffer`; compacted when a drain finishes
    head: usize,

    limits: ParserLimits,
    backlog: bool,
}

impl FrameExtractor {
    pub fn new(limits: ParserLimits) -> Self {
        Self { buffer: String::new(), head: 0, limits, backlog: false }
    }

    /// Append decoded text.
    ///
    /// When the buffer exceeds `max_buffer_len` only the last `keep_tail_len`
    /// bytes are kept; the number of bytes dropped is returned.
    pub fn push_str(&mut self, text: &str) -> Option<usize> {
        self.compact();
        self.buffer.push_str(text);

        if self.buffer.len() > self.limits.max_buffer_len {
            let dropped = self.trim_to_tail(self.limits.keep_tail_len);
            self.compact();
            Some(dropped)
        } else {
            None
        }
    }

    /// Scan the buffer, yielding events until no progress is possible or the
    /// step budget runs out.
    pub fn drain(&mut self) -> Drain<'_> {
        let budget = self.limits.max_steps_per_call;
        Drain { extractor: self, remaining: budget, finished: false }
    }

    /// True when the last drain stopped on its step budget with work left.
    pub fn has_backlog(&self) -> bool {
        self.backlog
    }

    /// Buffered text not yet consumed.
    pub fn buffered(&self) -> &str {
        &self.buffer[self.head..]
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len() - self.head
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.head = 0;
        self.backlog = false;
    }

    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    fn step(&mut self) -> Option<ScanEvent> {
        let live = &self.buffer[self.head..];

        let Some(start) = live.find('{') else {
            if live.len() > self.limits.keep_tail_len {
                let dropped = self.trim_to_tail(self.limits.keep_tail_len);
                return Some(ScanEvent::GarbageTrimmed { dropped });
            }
            return None;
        };

        if start > 0 {
            self.head += start;
            return Some(ScanEvent::GarbageSkipped { len: start });
        }

        match find_frame_end(live, self.limits.max_frame_len) {
            Some(end) => {
                let candidate = live[..=end].to_string();
                self.head += end + 1;
                Some(ScanEvent::Candidate(candidate))
            }
            None if live.len() > self.limits.max_frame_len => {
                let buffered = live.len();
                self.head += 1;
                Some(ScanEvent::ZombieDropped { buffered })
            }
            None => None,
        }
    }

    /// Drop the head so that at most `keep` live bytes remain, cutting on a
    /// character boundary.
    fn trim_to_tail(&mut self, keep: usize) -> usize {
        let live = self.buffer.len() - self.head;
        if live <= keep {
            return 0;
        }

        let mut cut = self.buffer.len() - keep;
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }

        let dropped = cut - self.head;
        self.head = cut;
        dropped
    }

    fn compact(&mut self) {
        if self.head > 0 {
            self.buffer.drain(..self.head);
            self.head = 0;
        }
    }
}

/// Iterator returned by [`FrameExtractor::drain`].
pub struct Drain<'a> {
    extractor: &'a mut FrameExtractor,
    remaining: usize,
    finished: bool,
}

impl Iterator for Drain<'_> {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        if self.finished {
            return None;
        }

        if self.remaining == 0 {
            self.extractor.backlog = true;
            self.finished = true;
            return None;
        }
        self.remaining -= 1;

        let event = self.extractor.step();
        if matches!(event, None | Some(ScanEvent::GarbageTrimmed { .. })) {
            self.extractor.backlog = false;
            self.finished = true;
        }
        event
    }
}

impl Drop for Drain<'_> {
    fn drop(&mut self) {
        self.extractor.compact();
    }
}

/// Byte index of the `}` closing the object that opens at `text[0]`.
///
/// At most `max_frame_len + 1` bytes are examined. Braces inside string
/// literals are ignored and a backslash escapes the next byte within a string.
pub fn find_frame_end(text: &str, max_frame_len: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    let limit = text.len().min(max_frame_len.saturating_add(1));
    for (index, &byte) in text.as_bytes()[..limit].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                // A stray close before any open is skipped
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits(max_frame_len: usize, max_buffer_len: usize, keep_tail_len: usize) -> ParserLimits {
        ParserLimits { max_frame_len, max_buffer_len, keep_tail_len, max_steps_per_call: 500 }
    }

    fn candidates(extractor: &mut FrameExtractor) -> Vec<String> {
        extractor
            .drain()
            .filter_map(|event| match event {
                ScanEvent::Candidate(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn back_to_back_frames() {
        let mut extractor = FrameExtractor::new(ParserLimits::default());
        extractor.push_str(r#"{"t":"D","s":1}{"t":"D","s":2}"#);

        assert_eq!(candidates(&mut extractor), vec![r#"{"t":"D","s":1}"#, r#"{"t":"D","s":2}"#]);
        assert_eq!(extractor.buffered_len(), 0);
        assert!(!extractor.has_backlog());
    }

    #[test]
    fn partial_then_complete() {
        let mut extractor = FrameExtractor::new(ParserLimits::default());
        extractor.push_str(r#"{"t":"D","#);
        assert!(candidates(&mut extractor).is_empty());
        assert_eq!(extractor.buffered(), r#"{"t":"D","#);

        extractor.push_str(r#""s":1}"#);
        assert_eq!(candidates(&mut extractor), vec![r#"{"t":"D","s":1}"#]);
    }

    #[test]
    fn quoted_braces_are_not_structural() {
        let frame = r#"{"t":"D","note":"a{b}\"c\""}"#;
        let mut extractor = FrameExtractor::new(ParserLimits::default());
        extractor.push_str(frame);
        extractor.push_str(r#"{"t":"D"}"#);

        assert_eq!(candidates(&mut extractor), vec![frame, r#"{"t":"D"}"#]);
    }

    #[test]
    fn escaped_backslash_closes_string() {
        let frame = r#"{"t":"D","path":"C:\\"}"#;
        assert_eq!(find_frame_end(frame, 4096), Some(frame.len() - 1));
    }

    #[test]
    fn nested_objects_close_at_depth_zero() {
        let frame = r#"{"t":"D","m":{"a":{"b":1}},"n":2}"#;
        let mut extractor = FrameExtractor::new(ParserLimits::default());
        extractor.push_str(frame);
        assert_eq!(candidates(&mut extractor), vec![frame]);
    }

    #[test]
    fn leading_garbage_is_skipped() {
        let mut extractor = FrameExtractor::new(ParserLimits::default());
        extractor.push_str("\u{FFFD}}}ok]{\"t\":\"D\"}");

        let events: Vec<_> = extractor.drain().collect();
        assert_eq!(
            events,
            vec![
                ScanEvent::GarbageSkipped { len: "\u{FFFD}}}ok]".len() },
                ScanEvent::Candidate(r#"{"t":"D"}"#.to_string()),
            ]
        );
    }

    #[test]
    fn zombie_is_dropped_one_brace_at_a_time() {
        let mut extractor = FrameExtractor::new(limits(16, 1024, 512));
        extractor.push_str(r#"{"t":"D","s":"unterminated"#);
        extractor.push_str(r#"{"t":"D"}"#);

        let events: Vec<_> = extractor.drain().collect();
        assert!(matches!(events[0], ScanEvent::ZombieDropped { .. }));
        assert_eq!(events.last(), Some(&ScanEvent::Candidate(r#"{"t":"D"}"#.to_string())));
        assert_eq!(extractor.buffered_len(), 0);
    }

    #[test]
    fn short_unterminated_frame_waits() {
        let mut extractor = FrameExtractor::new(limits(16, 1024, 512));
        extractor.push_str(r#"{"t":"D""#);
        assert_eq!(extractor.drain().count(), 0);
        assert_eq!(extractor.buffered(), r#"{"t":"D""#);
    }

    #[test]
    fn buffer_without_braces_is_trimmed_to_tail() {
        let mut extractor = FrameExtractor::new(limits(16, 1024, 64));
        extractor.push_str(&"x".repeat(100));

        let events: Vec<_> = extractor.drain().collect();
        assert_eq!(events, vec![ScanEvent::GarbageTrimmed { dropped: 36 }]);
        assert_eq!(extractor.buffered_len(), 64);
    }

    #[test]
    fn buffer_cap_keeps_tail_on_char_boundary() {
        let mut extractor = FrameExtractor::new(limits(16, 64, 10));

        // 90 bytes; the nearest boundary at or after byte 80 is 81
        assert_eq!(extractor.push_str(&"가".repeat(30)), Some(81));
        assert_eq!(extractor.buffered_len(), 9);
        assert!(extractor.buffered().chars().all(|c| c == '가'));
    }

    #[test]
    fn push_reports_trim() {
        let mut extractor = FrameExtractor::new(limits(16, 64, 32));
        assert_eq!(extractor.push_str(&"a".repeat(64)), None);
        assert_eq!(extractor.push_str("b"), Some(33));
        assert_eq!(extractor.buffered_len(), 32);
    }

    #[test]
    fn step_budget_leaves_backlog() {
        let mut limits = ParserLimits::default();
        limits.max_steps_per_call = 3;
        let mut extractor = FrameExtractor::new(limits);
        extractor.push_str(&r#"{"t":"D"}"#.repeat(5));

        assert_eq!(candidates(&mut extractor).len(), 3);
        assert!(extractor.has_backlog());

        assert_eq!(candidates(&mut extractor).len(), 2);
        assert!(!extractor.has_backlog());
    }

    #[test]
    fn stray_close_before_open_is_ignored() {
        assert_eq!(find_frame_end("{}", 16), Some(1));
        assert_eq!(find_frame_end("}{}", 16), Some(2));
        assert_eq!(find_frame_end("{\"a\":\"}\"}", 16), Some(8));
        assert_eq!(find_frame_end("{{}", 16), None);
    }

    #[test]
    fn scan_is_limited_to_max_frame_len() {
        let frame = format!(r#"{{"t":"{}"}}"#, "x".repeat(20));
        assert_eq!(find_frame_end(&frame, frame.len() - 1), Some(frame.len() - 1));
        assert_eq!(find_frame_end(&frame, frame.len() - 2), None);
    }

    #[test]
    fn clear_empties_everything() {
        let mut extractor = FrameExtractor::new(ParserLimits::default());
        extractor.push_str(r#"{"t":"D","#);
        extractor.clear();
        assert_eq!(extractor.buffered_len(), 0);

        extractor.push_str(r#""s":1}"#);
        assert!(candidates(&mut extractor).is_empty());
    }

    proptest! {
        #[test]
        fn any_chunking_yields_same_frames(
            values in proptest::collection::vec(0i32..1000, 1..8),
            split in proptest::collection::vec(1usize..12, 1..40),
        ) {
            let frames: Vec<String> = values
                .iter()
                .map(|v| format!(r#"{{"t":"D","s":{},"n":"{{\"}}"}}"#, v))
                .collect();
            let stream = frames.concat();

            let mut extractor = FrameExtractor::new(ParserLimits::default());
            let mut found = Vec::new();
            let mut rest = stream.as_str();
            let mut sizes = split.iter().cycle();
            while !rest.is_empty() {
                let mut size = (*sizes.next().unwrap_or(&1)).min(rest.len());
                while !rest.is_char_boundary(size) {
                    size += 1;
                }
                let (head, tail) = rest.split_at(size);
                extractor.push_str(head);
                found.extend(candidates(&mut extractor));
                rest = tail;
            }

            prop_assert_eq!(found, frames);
        }

        #[test]
        fn buffer_stays_bounded(chunks in proptest::collection::vec("[^{]{0,200}", 1..50)) {
            let limits = limits(64, 1024, 256);
            let mut extractor = FrameExtractor::new(limits.clone());
            for chunk in &chunks {
                extractor.push_str(chunk);
                extractor.drain().for_each(drop);
                prop_assert!(extractor.buffered_len() <= limits.max_buffer_len);
                prop_assert!(extractor.buffered_len() <= limits.keep_tail_len);
            }
        }

        #[test]
        fn corrupted_prefix_resynchronizes(garbage in "[a-z{\":,]{0,300}") {
            let mut extractor = FrameExtractor::new(limits(64, 64 * 1024, 16 * 1024));
            let mut found = Vec::new();
            extractor.push_str(&garbage);
            found.extend(candidates(&mut extractor));

            // An open string in the garbage can swallow a following frame;
            // a long enough gap lets the zombie path clear it.
            extractor.push_str(&" ".repeat(80));
            extractor.push_str(r#"{"t":"D","s":1}"#);
            extractor.push_str(r#"{"t":"D","s":2}"#);
            for _ in 0..10 {
                found.extend(candidates(&mut extractor));
            }

            let found_second = found.iter().any(|frame| frame == r#"{"t":"D","s":2}"#);
            prop_assert!(found_second);
        }
    }
}
