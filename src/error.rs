//! Error type shared by every stage of replay decoding.
//!
//! Every variant is terminal for the decode call that produced it.  No stage
//! retries, and no partially populated record ever escapes a failed decode.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReplayError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReplayError {
    /// Fewer bytes remain than the field at `offset` requires.
    #[error("Truncated input at offset {offset}: need {needed} byte(s), {available} available")]
    TruncatedInput { offset: usize, needed: usize, available: usize },

    /// A string marker byte that is neither `0x00` nor `0x0B`.
    #[error("Invalid replay: unexpected string marker 0x{byte:02x} at offset {offset}")]
    InvalidReplayFormat { offset: usize, byte: u8 },

    #[error("Invalid game mode value: {0}")]
    InvalidModeValue(u8),

    #[error("Invalid mod value: {0:#x}")]
    InvalidModValue(u32),

    #[error("Malformed varint starting at offset {offset}")]
    MalformedVarint { offset: usize },

    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// The trailing marker row carries a zero seed.
    #[error("Replay might be corrupt: marker row has a zero seed")]
    CorruptReplay,

    #[error("Invalid UTF-8 in string starting at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Invalid compressed block length {length} at offset {offset}")]
    InvalidBlockLength { offset: usize, length: i32 },

    #[error("Malformed event row {row}: {details}")]
    MalformedEvent { row: usize, details: String },

    #[error("Timestamp out of range: {0} ticks")]
    InvalidTimestamp(i64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ReplayError {
    pub(crate) fn malformed_event(row: usize, details: impl Into<String>) -> Self {
        Self::MalformedEvent { row, details: details.into() }
    }

    /// True for errors caused by the replay bytes themselves rather than the
    /// filesystem.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
