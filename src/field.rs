//! Header field reader: the cursor every decode stage reads through.
//!
//! # Encodings
//! - Fixed-width primitives are strictly little-endian.
//! - **Modern string**: marker `0x00` (empty) or `0x0B` followed by a ULEB128
//!   byte length and that many UTF-8 bytes.  Any other marker is rejected.
//! - **Legacy string**: marker `0x00` (empty) or any other marker byte
//!   followed by a NUL-terminated UTF-8 run.
//!
//! A read either consumes exactly the bytes its field needs or fails with
//! [`ReplayError::TruncatedInput`] and leaves the cursor where it was.
//! A [`FieldReader`] is created per decode call and owns its cursor; nothing
//! about the position is shared between calls.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor};

use crate::error::{ReplayError, Result};

/// Marker for an empty/absent string.
pub const STRING_ABSENT:  u8 = 0x00;
/// Marker for a length-prefixed string.
pub const STRING_PRESENT: u8 = 0x0B;
/// A u64 needs at most ten 7-bit groups.
pub const MAX_VARINT_BYTES: usize = 10;

pub struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { cursor: Cursor::new(data) }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data().len().saturating_sub(self.position())
    }

    #[inline]
    fn data(&self) -> &'a [u8] {
        *self.cursor.get_ref()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if available < needed {
            return Err(ReplayError::TruncatedInput { offset: self.position(), needed, available });
        }
        Ok(())
    }

    /// Run a byteorder read of `width` bytes after a bounds check.
    fn fixed<T>(
        &mut self,
        width: usize,
        read:  impl FnOnce(&mut Cursor<&'a [u8]>) -> io::Result<T>,
    ) -> Result<T> {
        self.ensure(width)?;
        let offset = self.position();
        read(&mut self.cursor).map_err(|_| ReplayError::TruncatedInput {
            offset,
            needed:    width,
            available: self.remaining(),
        })
    }

    // ── Primitives ────────────────────────────────────────────────────────────

    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data()[self.position()])
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.cursor.set_position((self.position() + n) as u64);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.fixed(1, |c| c.read_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.fixed(2, |c| c.read_i16::<LittleEndian>())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.fixed(2, |c| c.read_u16::<LittleEndian>())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.fixed(4, |c| c.read_i32::<LittleEndian>())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.fixed(4, |c| c.read_u32::<LittleEndian>())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.fixed(8, |c| c.read_i64::<LittleEndian>())
    }

    /// Borrow the next `n` bytes of the input and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let start = self.position();
        let bytes = &self.data()[start..start + n];
        self.cursor.set_position((start + n) as u64);
        Ok(bytes)
    }

    // ── Variable-length encodings ─────────────────────────────────────────────

    /// Unsigned LEB128: low 7 bits per byte, least significant group first,
    /// high bit set on every byte but the last.
    pub fn read_uleb128(&mut self) -> Result<u64> {
        let start = self.position();
        let mut value = 0u64;
        let mut shift = 0u32;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = match self.read_u8() {
                Ok(b)  => b,
                Err(e) => {
                    self.cursor.set_position(start as u64);
                    return Err(e);
                }
            };
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }

        self.cursor.set_position(start as u64);
        Err(ReplayError::MalformedVarint { offset: start })
    }

    /// Modern string: `0x00` → empty, `0x0B` → ULEB128 length + UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.position();
        match self.peek_u8()? {
            STRING_ABSENT => {
                self.skip(1)?;
                Ok(String::new())
            }
            STRING_PRESENT => {
                self.skip(1)?;
                let text = self.read_string_body();
                if text.is_err() {
                    self.cursor.set_position(start as u64);
                }
                text
            }
            byte => Err(ReplayError::InvalidReplayFormat { offset: start, byte }),
        }
    }

    fn read_string_body(&mut self) -> Result<String> {
        let len_offset = self.position();
        let len = self.read_uleb128()?;
        let len = usize::try_from(len).map_err(|_| ReplayError::TruncatedInput {
            offset:    len_offset,
            needed:    usize::MAX,
            available: self.remaining(),
        })?;
        let body_offset = self.position();
        let bytes = self.read_bytes(len)?;
        decode_utf8(bytes, body_offset)
    }

    /// Legacy string: `0x00` → empty; any other marker is followed by a
    /// NUL-terminated run.  The cursor ends just past the terminator.
    pub fn read_legacy_string(&mut self) -> Result<String> {
        if self.peek_u8()? == STRING_ABSENT {
            self.skip(1)?;
            return Ok(String::new());
        }

        let body_offset = self.position() + 1;
        let rest = &self.data()[body_offset..];
        let end = rest.iter().position(|&b| b == 0).ok_or(ReplayError::TruncatedInput {
            offset:    body_offset,
            needed:    rest.len() + 1,
            available: rest.len(),
        })?;
        let text = decode_utf8(&rest[..end], body_offset)?;
        self.cursor.set_position((body_offset + end + 1) as u64);
        Ok(text)
    }
}

fn decode_utf8(bytes: &[u8], offset: usize) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| ReplayError::InvalidUtf8 { offset })
}
