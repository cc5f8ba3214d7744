//! Field access on frame payloads
//!
//! Payloads are ASCII hex strings. Offsets are character offsets into the
//! payload (the selector character already stripped).
//!
//! ```text
//! EM:   tt aa cc 1111 2222 3333      type, address, counter, 3 x swapped u16
//! FHT:  hhhh cc ss [vv]              house code, function, status, value
//! FS20: hhhh aa cc [.. ee]           house code, device, command, extension
//! ```

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::router::Protocol;

/// Validated view of a frame payload
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
    text: &'a str,
}

impl<'a> Payload<'a> {
    /// Wrap a payload, checking it is ASCII and at least `min_len` long
    pub fn new(protocol: Protocol, text: &'a str, min_len: usize) -> Result<Self> {
        if text.len() < min_len {
            return Err(Error::FrameTooShort {
                protocol,
                expected: min_len,
                actual: text.len(),
            });
        }

        if !text.is_ascii() {
            return Err(Error::NonAscii { protocol });
        }

        Ok(Self { text })
    }

    /// Raw characters `start..end`, clipped to the payload
    pub fn raw(&self, start: usize, end: usize) -> &'a str {
        let end = end.min(self.text.len());
        self.text.get(start.min(end)..end).unwrap_or("")
    }

    /// One hex byte at `offset`
    pub fn byte(&self, offset: usize) -> Result<u8> {
        let mut out = [0u8; 1];
        self.decode(offset, &mut out)?;
        Ok(out[0])
    }

    /// One hex byte at `offset`, `None` when the payload ends before it
    pub fn optional_byte(&self, offset: usize) -> Result<Option<u8>> {
        if self.text.len() < offset + 2 {
            return Ok(None);
        }
        self.byte(offset).map(Some)
    }

    /// 16-bit value stored low byte first at `offset` (4 characters)
    pub fn swapped_u16(&self, offset: usize) -> Result<u16> {
        let mut out = [0u8; 2];
        self.decode(offset, &mut out)?;
        Ok(LittleEndian::read_u16(&out))
    }

    fn decode(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        let field = self.raw(offset, offset + out.len() * 2);

        hex::decode_to_slice(field, out).map_err(|_| Error::InvalidHex {
            offset,
            value: field.to_string(),
        })
    }
}
