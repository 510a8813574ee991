//! Streaming UTF-8 decoding across chunk boundaries

/// Text decoded from one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,

    /// Invalid sequences replaced with U+FFFD
    pub replaced: usize,
}

/// Decodes a chunked byte stream, holding back an incomplete trailing
/// character until the chunk that completes it arrives.
///
/// Decoding never fails. Invalid sequences become U+FFFD, which can never be
/// mistaken for a brace or quote by the frame extractor.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    carry: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, prefixed by any bytes carried from the previous call.
    pub fn decode(&mut self, chunk: &[u8]) -> Decoded {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        let mut decoded = Decoded { text: String::with_capacity(bytes.len()), replaced: 0 };
        let mut pieces = bytes.utf8_chunks().peekable();

        while let Some(piece) = pieces.next() {
            decoded.text.push_str(piece.valid());

            let invalid = piece.invalid();
            if invalid.is_empty() {
                continue;
            }

            if pieces.peek().is_none() && is_incomplete_sequence(invalid) {
                self.carry = invalid.to_vec();
                break;
            }

            decoded.text.push(char::REPLACEMENT_CHARACTER);
            decoded.replaced += 1;
        }

        decoded
    }

    /// Bytes currently held for the next call.
    pub fn carried(&self) -> &[u8] {
        &self.carry
    }

    pub fn reset(&mut self) {
        self.carry.clear();
    }
}

/// Encoded length announced by a UTF-8 lead byte.
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// The invalid tail is a valid prefix that more bytes could complete.
fn is_incomplete_sequence(tail: &[u8]) -> bool {
    tail.first()
        .and_then(|&lead| sequence_len(lead))
        .is_some_and(|expected| expected > tail.len())
}
