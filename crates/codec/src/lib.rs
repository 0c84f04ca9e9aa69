//! # Codec — byte-level encoding primitives
//!
//! Shared building blocks for every on-disk structure in UndertowKV: fixed
//! little-endian integers, varint32, CRC32, and the common-prefix helper used
//! by the data block's prefix compression.
//!
//! All multi-byte integers in the on-disk formats are **little-endian**. The
//! `get_*` functions consume bytes from the front of a `&mut &[u8]` view and
//! return `None` on truncation, so callers can map the failure into their own
//! error taxonomy without this crate taking a position on it.
//!
//! ## Example
//!
//! ```rust
//! let mut buf = Vec::new();
//! codec::put_varint32(&mut buf, 300);
//! let mut view = buf.as_slice();
//! assert_eq!(codec::get_varint32(&mut view), Some(300));
//! assert!(view.is_empty());
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;

/// Maximum encoded length of a varint32 (5 groups of 7 bits cover 32 bits).
pub const MAX_VARINT32_LEN: usize = 5;

/// Appends a `u32` in little-endian byte order.
pub fn put_fixed32(dst: &mut Vec<u8>, v: u32) {
    dst.extend_from_slice(&v.to_le_bytes());
}

/// Appends a `u64` in little-endian byte order.
pub fn put_fixed64(dst: &mut Vec<u8>, v: u64) {
    dst.extend_from_slice(&v.to_le_bytes());
}

/// Consumes 4 bytes from the front of `input` and decodes a little-endian
/// `u32`. Returns `None` (leaving `input` unspecified) if fewer than 4 bytes
/// remain.
pub fn get_fixed32(input: &mut &[u8]) -> Option<u32> {
    input.read_u32::<LittleEndian>().ok()
}

/// Consumes 8 bytes from the front of `input` and decodes a little-endian
/// `u64`. Returns `None` if fewer than 8 bytes remain.
pub fn get_fixed64(input: &mut &[u8]) -> Option<u64> {
    input.read_u64::<LittleEndian>().ok()
}

/// Appends `v` as a varint32: 7 data bits per byte, MSB set on every byte
/// except the last. Values below 128 encode in a single byte.
pub fn put_varint32(dst: &mut Vec<u8>, mut v: u32) {
    while v >= 0x80 {
        dst.push((v as u8) | 0x80);
        v >>= 7;
    }
    dst.push(v as u8);
}

/// Decodes a varint32 from the front of `input`, consuming the encoded bytes
/// on success.
///
/// Returns `None` if the input ends before a terminating byte, or if the
/// continuation bit is still set after [`MAX_VARINT32_LEN`] bytes (an
/// overlong encoding).
pub fn get_varint32(input: &mut &[u8]) -> Option<u32> {
    let mut result: u32 = 0;
    let mut shift = 0;
    let mut i = 0;
    while i < input.len() && shift <= 28 {
        let byte = input[i];
        i += 1;
        result |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            *input = &input[i..];
            return Some(result);
        }
        shift += 7;
    }
    None
}

/// CRC32 over exactly the given bytes (IEEE polynomial `0xEDB88320`,
/// reflected, init and final XOR `0xFFFFFFFF`). No implicit framing.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// Length of the longest common prefix of `a` and `b`.
pub fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    let n = a.len().min(b.len());
    let mut i = 0;
    while i < n && a[i] == b[i] {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests;
