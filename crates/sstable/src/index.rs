//! Index blocks: divider keys mapped to data block handles.

use crate::error::Error;
use crate::format::BlockHandle;

/// Builds the index block: one `(divider, handle)` entry per data block, in
/// strictly increasing divider order. The divider is the smallest key of the
/// data block the handle points at.
pub struct IndexBlockBuilder {
    buffer: Vec<u8>,
    /// Byte offset of each entry, recorded for the trailer.
    offsets: Vec<u32>,
    last_key: Vec<u8>,
}

impl IndexBlockBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            offsets: Vec::new(),
            last_key: Vec::new(),
        }
    }

    /// Appends an entry: `varint32(|divider|) | divider | handle(16)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyOrder`] when `divider` does not sort after the
    /// previous divider.
    pub fn add(&mut self, divider: &[u8], handle: &BlockHandle) -> Result<(), Error> {
        if !self.last_key.is_empty() && self.last_key.as_slice() >= divider {
            return Err(Error::KeyOrder);
        }
        self.offsets.push(self.buffer.len() as u32);
        codec::put_varint32(&mut self.buffer, divider.len() as u32);
        self.buffer.extend_from_slice(divider);
        handle.encode_to(&mut self.buffer);

        self.last_key.clear();
        self.last_key.extend_from_slice(divider);
        Ok(())
    }

    /// Returns `true` if no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of entries added so far.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.offsets.len()
    }

    /// Finalizes the block: appends entry offsets and their count.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        for &offset in &self.offsets {
            codec::put_fixed32(&mut self.buffer, offset);
        }
        codec::put_fixed32(&mut self.buffer, self.offsets.len() as u32);
        self.buffer
    }
}

impl Default for IndexBlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary-search reader over a serialized index block.
pub struct IndexBlockReader<'a> {
    /// The entries region (block minus the trailer).
    entries: &'a [u8],
    offsets: Vec<u32>,
}

impl<'a> IndexBlockReader<'a> {
    /// Parses the trailer and validates that entry offsets are strictly
    /// increasing and in range.
    ///
    /// # Errors
    ///
    /// [`Error::Truncated`] if the block cannot hold its own trailer;
    /// [`Error::Corrupt`] on out-of-range or non-monotonic offsets.
    pub fn new(block: &'a [u8]) -> Result<Self, Error> {
        if block.len() < 4 {
            return Err(Error::Truncated("index trailer"));
        }
        let mut tail = &block[block.len() - 4..];
        let num_entries =
            codec::get_fixed32(&mut tail).ok_or(Error::Truncated("index trailer"))? as usize;

        let offset_bytes = num_entries
            .checked_mul(4)
            .ok_or(Error::Corrupt("index entry count"))?;
        if block.len() < 4 + offset_bytes {
            return Err(Error::Corrupt("offset array exceeds block"));
        }
        let entries_len = block.len() - 4 - offset_bytes;

        let mut offsets = Vec::with_capacity(num_entries);
        let mut view = &block[entries_len..block.len() - 4];
        for i in 0..num_entries {
            let offset = codec::get_fixed32(&mut view).ok_or(Error::Truncated("offset array"))?;
            if offset as usize >= entries_len {
                return Err(Error::Corrupt("index offset out of range"));
            }
            if i > 0 && offset <= offsets[i - 1] {
                return Err(Error::Corrupt("index offsets not increasing"));
            }
            offsets.push(offset);
        }

        Ok(Self {
            entries: &block[..entries_len],
            offsets,
        })
    }

    /// Routes `search_key` to a data block: returns the handle of the
    /// rightmost entry whose divider is `<= search_key` (a divider equal to
    /// the key is kept). Returns `None` iff the key sorts before the first
    /// divider — the key cannot be in any indexed block.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] when an entry cannot be decoded.
    pub fn find(&self, search_key: &[u8]) -> Result<Option<BlockHandle>, Error> {
        if self.offsets.is_empty() {
            return Ok(None);
        }

        let mut lo = 0usize;
        let mut hi = self.offsets.len() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let (key, _) = self.entry_at(mid)?;
            if key <= search_key {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        let (key, handle) = self.entry_at(lo)?;
        if key > search_key {
            return Ok(None);
        }
        Ok(Some(handle))
    }

    /// Number of entries in the block.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.offsets.len()
    }

    /// Decodes the divider key and handle of entry `idx`.
    fn entry_at(&self, idx: usize) -> Result<(&'a [u8], BlockHandle), Error> {
        let offset = self.offsets[idx] as usize;
        let mut view = self
            .entries
            .get(offset..)
            .ok_or(Error::Corrupt("index entry out of range"))?;
        let klen =
            codec::get_varint32(&mut view).ok_or(Error::Corrupt("bad divider length"))? as usize;
        if view.len() < klen + BlockHandle::ENCODED_LEN {
            return Err(Error::Corrupt("index entry out of range"));
        }
        let key = &view[..klen];
        let mut handle_view = &view[klen..];
        let handle = BlockHandle::decode_from(&mut handle_view)?;
        Ok((key, handle))
    }
}
