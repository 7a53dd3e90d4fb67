//! Event stream decompression.
//!
//! The event block of a replay is an LZMA stream.  The client has always
//! written the legacy "LZMA alone" layout (13-byte properties header), but
//! the block is self-describing: an `.xz` container is recognised by its
//! magic and routed to the xz decoder instead.  Callers never choose the
//! container themselves.
//!
//! The decompressed payload is text with one sentinel character appended by
//! the encoder; [`decode_event_text`] strips it.

use std::io::Cursor;

use crate::error::{ReplayError, Result};

/// `.xz` stream header magic.
pub const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];

// ── Container discriminant ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Properties byte, dictionary size, unpacked size, then raw LZMA.
    LzmaAlone,
    Xz,
}

impl Container {
    /// Pick the container from the stream's own header.
    pub fn detect(block: &[u8]) -> Self {
        if block.starts_with(&XZ_MAGIC) {
            Container::Xz
        } else {
            Container::LzmaAlone
        }
    }

    /// Human-readable name (for diagnostics only).
    pub fn name(self) -> &'static str {
        match self {
            Container::LzmaAlone => "lzma",
            Container::Xz        => "xz",
        }
    }
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn container(&self) -> Container;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

pub struct LzmaCodec;
impl Codec for LzmaCodec {
    fn container(&self) -> Container { Container::LzmaAlone }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        lzma_rs::lzma_decompress(&mut Cursor::new(data), &mut out)
            .map_err(|e| ReplayError::DecompressionError(e.to_string()))?;
        Ok(out)
    }
}

pub struct XzCodec;
impl Codec for XzCodec {
    fn container(&self) -> Container { Container::Xz }
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        lzma_rs::xz_decompress(&mut Cursor::new(data), &mut out)
            .map_err(|e| ReplayError::DecompressionError(e.to_string()))?;
        Ok(out)
    }
}

pub fn get_codec(container: Container) -> Box<dyn Codec> {
    match container {
        Container::LzmaAlone => Box::new(LzmaCodec),
        Container::Xz        => Box::new(XzCodec),
    }
}

// ── Event text ───────────────────────────────────────────────────────────────

/// Decompress an event block and return its text without the trailing
/// sentinel character.
pub fn decode_event_text(block: &[u8]) -> Result<String> {
    let container = Container::detect(block);
    tracing::trace!(container = container.name(), len = block.len(), "decompressing event block");

    let raw = get_codec(container).decompress(block)?;
    let mut text = String::from_utf8(raw).map_err(|e| ReplayError::InvalidUtf8 {
        offset: e.utf8_error().valid_up_to(),
    })?;
    text.pop();
    Ok(text)
}
