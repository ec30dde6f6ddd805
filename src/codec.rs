//! 7-bit-safe data codec.
//!
//! Firmata keeps the top bit of every data byte free for framing, so 8-bit
//! payloads travel as pairs of 7-bit bytes and 14-bit analog readings as a
//! low/high pair.

use crate::error::{Error, Result};

/// Combines a 7-bit low/high pair into a 14-bit value.
#[inline]
pub fn fourteen_bit(lsb: u8, msb: u8) -> u16 {
    (lsb as u16 & 0x7F) | ((msb as u16 & 0x7F) << 7)
}

/// Decodes a 7-bit-pair payload back into raw bytes.
///
/// Each pair of wire bytes reconstructs one payload byte:
/// `(first & 0x7F) | ((second & 0x7F) << 7)`. An odd number of wire bytes
/// cannot be paired losslessly and is a protocol error.
pub fn decode_pairs(wire: &[u8]) -> Result<Vec<u8>> {
    if wire.len() % 2 != 0 {
        return Err(Error::OddPayloadLength(wire.len()));
    }
    let mut data = Vec::with_capacity(wire.len() / 2);
    for pair in wire.chunks_exact(2) {
        data.push((pair[0] & 0x7F) | ((pair[1] & 0x7F) << 7));
    }
    Ok(data)
}

/// Decodes a 7-bit-pair payload as a string (firmware names are ASCII, but
/// anything non-UTF-8 is replaced rather than rejected).
pub fn decode_string(wire: &[u8]) -> Result<String> {
    Ok(String::from_utf8_lossy(&decode_pairs(wire)?).into_owned())
}

/// Encodes raw bytes into the two-wire-bytes-per-payload-byte form.
pub fn encode_pairs(data: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(data.len() * 2);
    for &b in data {
        wire.push(b & 0x7F);
        wire.push((b >> 7) & 0x7F);
    }
    wire
}
