//! # Bloom Filter
//!
//! A space-efficient probabilistic data structure for set membership testing.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the set
//! (no false negatives), but may occasionally report that a key **is** in the
//! set when it isn't (false positives). The false positive rate depends on the
//! number of bits and hash functions used.
//!
//! ## Usage in UndertowKV
//!
//! Each SSTable embeds a bloom filter built from its keys, stored as the
//! filter block referenced by the file footer. During point lookups the table
//! reader checks the filter first — if it says "not present", the index and
//! data blocks are never touched.
//!
//! ## Wire format
//!
//! ```text
//! [magic 'VKBF': u32][version=1: u32][num_bits: u64][num_hashes: u32][pad=0: u32][bits ...]
//! ```
//!
//! All integers little-endian; bits are packed LSB-first within each byte.
//!
//! ## Example
//!
//! ```rust
//! use bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::new(1000, 0.01);
//! bf.add(b"hello");
//! assert!(bf.might_contain(b"hello"));
//! ```

use std::f64::consts::LN_2;

use thiserror::Error;

/// Serialized header magic: the bytes `'V' 'K' 'B' 'F'` read as a
/// little-endian `u32`.
pub const FILTER_MAGIC: u32 = 0x4642_4B56;

/// Current serialization version.
pub const FILTER_VERSION: u32 = 1;

/// Fixed header length preceding the packed bit array.
pub const FILTER_HEADER_LEN: usize = 24;

/// Upper bound on the number of hash functions. The optimum k only grows
/// logarithmically with 1/p, so 30 covers any realistic target rate.
const MAX_NUM_HASHES: u32 = 30;

/// Errors produced when decoding a serialized filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BloomError {
    /// Fewer bytes than the fixed header requires.
    #[error("truncated filter header")]
    Truncated,
    /// Magic or version field does not match this format.
    #[error("bad filter magic or version")]
    BadHeader,
    /// Header declares zero bits or zero hashes.
    #[error("invalid filter parameters")]
    InvalidParams,
    /// Byte count does not match the bit count declared in the header.
    #[error("filter length does not match header")]
    LengthMismatch,
}

/// A bloom filter backed by a bit vector with `k` hash positions per key.
///
/// Positions are generated by double hashing: two independent 64-bit hashes
/// `h1` and `h2` seed the probe sequence `x_{i+1} = (x_i + step) mod m` with
/// `step = (h2 << 1) | 1`. The step is forced odd so the sequence covers
/// every residue when `m` is a power of two and stays well-distributed
/// otherwise.
#[derive(PartialEq)]
pub struct BloomFilter {
    /// The packed bit array, LSB-first within each byte.
    bits: Vec<u8>,
    /// Number of bits in the filter (m).
    num_bits: u64,
    /// Number of hash positions per key (k).
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates a filter sized for `expected_items` insertions at the given
    /// target `false_positive_rate`.
    ///
    /// The rate is clamped into `(1e-9, 0.999999)`; `expected_items == 0`
    /// yields a minimal one-bit filter. Once sized, `m` and `k` are fixed.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        let num_bits = optimal_num_bits(expected_items, false_positive_rate);
        let num_hashes = optimal_num_hashes(expected_items, num_bits);
        let byte_len = ((num_bits + 7) / 8) as usize;
        Self {
            bits: vec![0u8; byte_len],
            num_bits,
            num_hashes,
        }
    }

    /// Rebuilds a filter from raw parts (used during deserialization).
    fn from_raw(bits: Vec<u8>, num_bits: u64, num_hashes: u32) -> Self {
        Self {
            bits,
            num_bits,
            num_hashes,
        }
    }

    /// Inserts a key by setting its `k` derived bit positions.
    pub fn add(&mut self, key: &[u8]) {
        if self.num_bits == 0 {
            return;
        }
        let (mut x, step) = self.probe_start(key);
        for _ in 0..self.num_hashes {
            self.set_bit(x);
            x = x.wrapping_add(step) % self.num_bits;
        }
    }

    /// Returns `false` if the key is **definitely not** in the set, `true`
    /// if it **might** be.
    #[must_use]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        if self.num_bits == 0 {
            return false;
        }
        let (mut x, step) = self.probe_start(key);
        for _ in 0..self.num_hashes {
            if !self.get_bit(x) {
                return false;
            }
            x = x.wrapping_add(step) % self.num_bits;
        }
        true
    }

    /// Returns the number of bits in the filter.
    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Returns the number of hash positions per key.
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Returns the exact size of [`serialize`](Self::serialize) output.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        FILTER_HEADER_LEN + self.bits.len()
    }

    /// Serializes the filter: fixed header followed by the packed bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size());
        codec::put_fixed32(&mut out, FILTER_MAGIC);
        codec::put_fixed32(&mut out, FILTER_VERSION);
        codec::put_fixed64(&mut out, self.num_bits);
        codec::put_fixed32(&mut out, self.num_hashes);
        codec::put_fixed32(&mut out, 0); // pad, reserved
        out.extend_from_slice(&self.bits);
        out
    }

    /// Reconstructs a filter from [`serialize`](Self::serialize) output.
    ///
    /// # Errors
    ///
    /// Fails if the header is truncated, the magic/version do not match,
    /// `m` or `k` is zero, or the byte count disagrees with `m`.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, BloomError> {
        let mut view = bytes;
        let magic = codec::get_fixed32(&mut view).ok_or(BloomError::Truncated)?;
        let version = codec::get_fixed32(&mut view).ok_or(BloomError::Truncated)?;
        let num_bits = codec::get_fixed64(&mut view).ok_or(BloomError::Truncated)?;
        let num_hashes = codec::get_fixed32(&mut view).ok_or(BloomError::Truncated)?;
        let _pad = codec::get_fixed32(&mut view).ok_or(BloomError::Truncated)?;

        if magic != FILTER_MAGIC || version != FILTER_VERSION {
            return Err(BloomError::BadHeader);
        }
        if num_bits == 0 || num_hashes == 0 {
            return Err(BloomError::InvalidParams);
        }
        let needed = ((num_bits + 7) / 8) as usize;
        if view.len() != needed {
            return Err(BloomError::LengthMismatch);
        }

        Ok(Self::from_raw(view.to_vec(), num_bits, num_hashes))
    }

    // ---- Internal helpers ----

    /// Computes the first probe position and the (odd) step for a key.
    fn probe_start(&self, key: &[u8]) -> (u64, u64) {
        let h1 = hash64(key, 0x243F_6A88_85A3_08D3);
        let h2 = hash64(key, 0x1319_8A2E_0370_7344);
        let step = (h2 << 1) | 1;
        (h1 % self.num_bits, step)
    }

    fn set_bit(&mut self, idx: u64) {
        let byte = (idx >> 3) as usize;
        self.bits[byte] |= 1 << (idx & 7);
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte = (idx >> 3) as usize;
        (self.bits[byte] >> (idx & 7)) & 1 == 1
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("bytes", &self.bits.len())
            .finish()
    }
}

/// Optimal bit count for `n` inserts at target rate `p`:
/// `m = -n * ln(p) / (ln 2)^2`, clamped to at least one bit.
fn optimal_num_bits(n: usize, p: f64) -> u64 {
    if n == 0 {
        return 1;
    }
    let p = p.clamp(1e-9, 0.999999);
    let m = (-(n as f64) * p.ln() / (LN_2 * LN_2)).ceil();
    (m as u64).max(1)
}

/// Optimal hash count for `n` inserts into `m` bits:
/// `k = (m/n) * ln 2`, rounded and clamped into `[1, MAX_NUM_HASHES]`.
fn optimal_num_hashes(n: usize, m: u64) -> u32 {
    if n == 0 || m == 0 {
        return 1;
    }
    let k = (m as f64 / n as f64) * LN_2;
    (k.round() as u32).clamp(1, MAX_NUM_HASHES)
}

/// Fast 64-bit hash (SplitMix64-style mixing) over arbitrary bytes.
///
/// Mixes 8-byte chunks, folds in the tail, then applies a final avalanche.
/// Not cryptographic; the two call sites use distinct seeds to decorrelate
/// the double-hashing pair.
fn hash64(data: &[u8], seed: u64) -> u64 {
    const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut x = seed ^ GOLDEN.wrapping_add(data.len() as u64);

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        x = x.wrapping_add(u64::from_le_bytes(word).wrapping_add(GOLDEN));
        x ^= x >> 30;
        x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    }

    let mut tail = 0u64;
    for (i, &b) in chunks.remainder().iter().enumerate() {
        tail |= u64::from(b) << (8 * i);
    }
    x = x.wrapping_add(tail);

    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    x
}
