//! Variable-length integers: LEB128 for unsigned values, zigzag + LEB128 for
//! signed deltas.

use crate::error::{CountsError, Result};

/// Largest encoded size of a u64.
pub const VARINT_MAX_SIZE: usize = 10;

/// Map a signed value onto an unsigned one so small magnitudes stay small.
#[inline(always)]
pub fn encode_zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline(always)]
pub fn decode_zigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Encode `value` and hand the bytes to `write_bytes`.
#[inline(always)]
pub fn encode_varint<T>(write_bytes: impl FnOnce(&[u8]) -> T, mut value: u64) -> T {
    let mut bytes = [0u8; VARINT_MAX_SIZE];
    let mut index = 0;
    while index < bytes.len() {
        let rem = ((value > 127) as u8) << 7;
        bytes[index] = ((value as u8) & 0b1111111) | rem;
        value >>= 7;
        index += 1;
        if value == 0 {
            break;
        }
    }
    write_bytes(&bytes[..index])
}

#[inline(always)]
pub fn encode_signed_varint<T>(write_bytes: impl FnOnce(&[u8]) -> T, value: i64) -> T {
    encode_varint(write_bytes, encode_zigzag(value))
}

/// Decode a varint from `data` starting at `*offset`, advancing the offset.
///
/// Truncated input and encodings longer than [`VARINT_MAX_SIZE`] bytes are
/// reported as [`CountsError::MalformedEncoding`].
#[inline]
pub fn decode_varint(data: &[u8], offset: &mut usize) -> Result<u64> {
    let start = *offset;
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let Some(&byte) = data.get(*offset) else {
            return Err(CountsError::malformed(start, "truncated varint"));
        };
        *offset += 1;
        if shift == 63 && byte > 1 {
            return Err(CountsError::malformed(start, "varint overflows 64 bits"));
        }
        result |= ((byte & 0b1111111) as u64) << shift;
        if byte & 0b10000000 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift > 63 {
            return Err(CountsError::malformed(start, "varint too long"));
        }
    }
}

#[inline]
pub fn decode_signed_varint(data: &[u8], offset: &mut usize) -> Result<i64> {
    decode_varint(data, offset).map(decode_zigzag)
}
