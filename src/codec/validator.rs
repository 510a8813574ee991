//! Candidate frame validation

use serde::de::IgnoredAny;
use thiserror::Error;

use crate::types::ValidatedFrame;

/// Characters of a rejected candidate kept for diagnostics.
pub const PREVIEW_CHARS: usize = 120;

/// Why a candidate was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("not delimited by braces")]
    NotDelimited,

    #[error("{0}")]
    Malformed(String),
}

/// A balanced candidate that is not a well-formed JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Broken JSON skipped ({reason}): {preview}")]
pub struct Rejection {
    /// First [`PREVIEW_CHARS`] characters of the candidate
    pub preview: String,
    pub reason: RejectReason,
}

/// Admit `candidate` as frame `seq` if it is a `{...}` JSON object.
pub fn validate(candidate: String, seq: u64) -> Result<ValidatedFrame, Rejection> {
    let reject = |text: &str, reason| Rejection {
        preview: text.chars().take(PREVIEW_CHARS).collect(),
        reason,
    };

    let text = candidate.trim();
    if !text.starts_with('{') || !text.ends_with('}') {
        return Err(reject(text, RejectReason::NotDelimited));
    }

    if let Err(err) = serde_json::from_str::<IgnoredAny>(text) {
        return Err(reject(text, RejectReason::Malformed(err.to_string())));
    }

    if text.len() == candidate.len() {
        Ok(ValidatedFrame::new(seq, candidate))
    } else {
        Ok(ValidatedFrame::new(seq, text))
    }
}
