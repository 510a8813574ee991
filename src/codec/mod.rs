//! Wire codecs for the device link.
//!
//! Inbound, bytes pass through three stages:
//! - [`Utf8StreamDecoder`] turns raw chunks into text, carrying split characters
//! - [`FrameExtractor`] cuts balanced `{...}` candidates out of the text stream
//! - [`validate`] admits candidates that parse as JSON objects
//!
//! Outbound, [`CommandPacket`] frames MCU commands with an XOR checksum.

mod command;
mod decoder;
mod extractor;
mod validator;

pub use command::{CommandPacket, McuCommand, xor_checksum};
pub use decoder::{Decoded, Utf8StreamDecoder};
pub use extractor::{Drain, FrameExtractor, ScanEvent, find_frame_end};
pub use validator::{PREVIEW_CHARS, RejectReason, Rejection, validate};
