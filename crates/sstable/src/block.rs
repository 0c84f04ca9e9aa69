//! Data blocks: restart-based prefix-compressed sorted key/value entries.

use std::cmp::Ordering;

use crate::error::Error;

/// Default number of entries between restart points. Smaller values speed up
/// point lookups at the cost of weaker prefix compression.
pub const DEFAULT_RESTART_INTERVAL: usize = 16;

/// Fixed per-entry header: `shared(4) + non_shared(4) + value_len(4)`.
const ENTRY_HEADER_LEN: usize = 12;

/// Builds one data block from strictly increasing keys.
///
/// Every `restart_interval` entries the builder emits a *restart point*: an
/// entry storing its key in full (`shared = 0`) whose offset is recorded in
/// the trailer. Entries between restarts store only the suffix that differs
/// from the previous key.
pub struct DataBlockBuilder {
    buffer: Vec<u8>,
    /// Offsets of restart entries; seeded with 0 for the first entry.
    restarts: Vec<u32>,
    first_key: Vec<u8>,
    last_key: Vec<u8>,
    restart_interval: usize,
    /// Entries since the last restart point.
    counter: usize,
    num_entries: usize,
}

impl DataBlockBuilder {
    /// Creates a builder with the given restart interval (clamped to >= 1).
    pub fn new(restart_interval: usize) -> Self {
        Self {
            buffer: Vec::new(),
            restarts: vec![0],
            first_key: Vec::new(),
            last_key: Vec::new(),
            restart_interval: restart_interval.max(1),
            counter: 0,
            num_entries: 0,
        }
    }

    /// Appends an entry. Keys must arrive in strictly increasing order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyOrder`] when `key` does not sort after the
    /// previous key.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<(), Error> {
        if !self.last_key.is_empty() && self.last_key.as_slice() >= key {
            return Err(Error::KeyOrder);
        }

        let shared = if self.counter == self.restart_interval {
            self.restarts.push(self.buffer.len() as u32);
            self.counter = 0;
            0
        } else {
            codec::shared_prefix_len(&self.last_key, key)
        };
        let non_shared = key.len() - shared;

        codec::put_fixed32(&mut self.buffer, shared as u32);
        codec::put_fixed32(&mut self.buffer, non_shared as u32);
        codec::put_fixed32(&mut self.buffer, value.len() as u32);
        self.buffer.extend_from_slice(&key[shared..]);
        self.buffer.extend_from_slice(value);

        if self.num_entries == 0 {
            self.first_key = key.to_vec();
        }
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.counter += 1;
        self.num_entries += 1;
        Ok(())
    }

    /// Returns `true` if no entries have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// The first (smallest) key added — the block's divider key.
    #[must_use]
    pub fn first_key(&self) -> &[u8] {
        &self.first_key
    }

    /// Size of the finished block given the current contents.
    #[must_use]
    pub fn current_size_estimate(&self) -> usize {
        self.buffer.len() + (self.restarts.len() + 1) * 4
    }

    /// Finalizes the block: appends the restart offsets and their count,
    /// and returns the serialized bytes. Consuming `self` makes adding to a
    /// finished block unrepresentable.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        for &offset in &self.restarts {
            codec::put_fixed32(&mut self.buffer, offset);
        }
        codec::put_fixed32(&mut self.buffer, self.restarts.len() as u32);
        self.buffer
    }
}

impl Default for DataBlockBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RESTART_INTERVAL)
    }
}

/// Point-lookup reader over a serialized data block.
///
/// Borrows the block bytes; values returned by [`get`](Self::get) share the
/// block's lifetime, not the reader's.
pub struct DataBlockReader<'a> {
    /// The entries region (block minus the trailer).
    entries: &'a [u8],
    restarts: Vec<u32>,
}

impl<'a> DataBlockReader<'a> {
    /// Parses the block trailer and validates the restart array.
    ///
    /// # Errors
    ///
    /// [`Error::Truncated`] if the block cannot hold its own trailer;
    /// [`Error::Corrupt`] if a restart offset lies past the entries region.
    pub fn new(block: &'a [u8]) -> Result<Self, Error> {
        if block.len() < 4 {
            return Err(Error::Truncated("block trailer"));
        }
        let mut tail = &block[block.len() - 4..];
        let num_restarts =
            codec::get_fixed32(&mut tail).ok_or(Error::Truncated("block trailer"))? as usize;

        let restart_bytes = num_restarts
            .checked_mul(4)
            .ok_or(Error::Corrupt("restart count"))?;
        if block.len() < 4 + restart_bytes {
            return Err(Error::Corrupt("restart array exceeds block"));
        }
        let entries_len = block.len() - 4 - restart_bytes;

        let mut restarts = Vec::with_capacity(num_restarts);
        let mut view = &block[entries_len..block.len() - 4];
        for _ in 0..num_restarts {
            let offset = codec::get_fixed32(&mut view).ok_or(Error::Truncated("restart array"))?;
            if offset as usize > entries_len {
                return Err(Error::Corrupt("restart offset out of range"));
            }
            restarts.push(offset);
        }

        Ok(Self {
            entries: &block[..entries_len],
            restarts,
        })
    }

    /// Looks up `target`, returning its value slice on an exact match.
    ///
    /// Phase 1 binary-searches the restart points (whose keys are stored in
    /// full) for the greatest restart key `<= target`; phase 2 scans that
    /// run linearly, reconstructing prefix-compressed keys, until it finds
    /// the target, passes it, or reaches the next restart.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] on structural violations: a restart entry with a
    /// nonzero shared length, `shared` exceeding the previous key, or any
    /// length running past the entries region.
    pub fn get(&self, target: &[u8]) -> Result<Option<&'a [u8]>, Error> {
        if self.restarts.is_empty() {
            return Ok(None);
        }

        // Phase 1: greatest restart index whose key <= target.
        let mut lo = 0usize;
        let mut hi = self.restarts.len() - 1;
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            let key = self.restart_key(self.restarts[mid] as usize)?;
            if key <= target {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }

        // Phase 2: linear scan inside the chosen run.
        let run_end = if lo + 1 < self.restarts.len() {
            self.restarts[lo + 1] as usize
        } else {
            self.entries.len()
        };

        let mut offset = self.restarts[lo] as usize;
        let mut prev_key: Vec<u8> = Vec::new();
        while offset < run_end {
            let entry = self.parse_entry(offset)?;
            if entry.shared > prev_key.len() {
                return Err(Error::Corrupt("shared prefix exceeds previous key"));
            }

            let mut key = prev_key;
            key.truncate(entry.shared);
            key.extend_from_slice(entry.key_suffix);

            match key.as_slice().cmp(target) {
                Ordering::Equal => return Ok(Some(entry.value)),
                Ordering::Greater => return Ok(None),
                Ordering::Less => {}
            }

            prev_key = key;
            offset = entry.next_offset;
        }
        Ok(None)
    }

    /// Number of restart points in the block.
    #[must_use]
    pub fn num_restarts(&self) -> usize {
        self.restarts.len()
    }

    /// Materializes the key of a restart entry, which must be stored in full.
    fn restart_key(&self, offset: usize) -> Result<&'a [u8], Error> {
        let entry = self.parse_entry(offset)?;
        if entry.shared != 0 {
            return Err(Error::Corrupt("restart entry has shared prefix"));
        }
        Ok(entry.key_suffix)
    }

    /// Decodes the entry at `offset`, bounds-checking every length.
    fn parse_entry(&self, offset: usize) -> Result<Entry<'a>, Error> {
        let mut view = self
            .entries
            .get(offset..)
            .ok_or(Error::Corrupt("entry offset out of range"))?;
        let shared =
            codec::get_fixed32(&mut view).ok_or(Error::Corrupt("entry header out of range"))? as usize;
        let non_shared =
            codec::get_fixed32(&mut view).ok_or(Error::Corrupt("entry header out of range"))? as usize;
        let value_len =
            codec::get_fixed32(&mut view).ok_or(Error::Corrupt("entry header out of range"))? as usize;

        let body_len = non_shared
            .checked_add(value_len)
            .ok_or(Error::Corrupt("entry lengths overflow"))?;
        if view.len() < body_len {
            return Err(Error::Corrupt("entry body out of range"));
        }

        Ok(Entry {
            shared,
            key_suffix: &view[..non_shared],
            value: &view[non_shared..body_len],
            next_offset: offset + ENTRY_HEADER_LEN + body_len,
        })
    }
}

/// One decoded entry: borrowed views plus the offset of the following entry.
struct Entry<'a> {
    shared: usize,
    key_suffix: &'a [u8],
    value: &'a [u8],
    next_offset: usize,
}
