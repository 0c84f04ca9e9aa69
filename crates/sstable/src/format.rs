//! Fixed on-disk structures: block pointers and the file footer.

use crate::error::Error;

/// Identifies a well-formed UndertowKV SSTable. Deliberately distinctive;
/// a format revision gets a new value.
pub const SSTABLE_MAGIC: u64 = 0xF00D_BAAD_F00D_BAAD;

/// Recommended extension for table files.
pub const SSTABLE_FILE_EXTENSION: &str = "sstable";

/// A compact pointer to a contiguous block within an SSTable file.
///
/// `offset` is absolute from the start of the file; `size` is the exact
/// block length. Once the file is closed, `offset + size <= file_size`
/// for every handle it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHandle {
    /// Absolute byte offset of the block within the file.
    pub offset: u64,
    /// Size of the block in bytes.
    pub size: u64,
}

impl BlockHandle {
    /// Serialized length: `offset(8) + size(8)`, little-endian.
    pub const ENCODED_LEN: usize = 16;

    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Appends the 16-byte little-endian encoding to `dst`.
    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        codec::put_fixed64(dst, self.offset);
        codec::put_fixed64(dst, self.size);
    }

    /// Decodes a handle from the front of `input`, consuming 16 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if fewer than 16 bytes remain.
    pub fn decode_from(input: &mut &[u8]) -> Result<Self, Error> {
        if input.len() < Self::ENCODED_LEN {
            return Err(Error::Truncated("block handle"));
        }
        let offset = codec::get_fixed64(input).ok_or(Error::Truncated("block handle"))?;
        let size = codec::get_fixed64(input).ok_or(Error::Truncated("block handle"))?;
        Ok(Self { offset, size })
    }
}

/// Fixed-size footer occupying the last 40 bytes of every SSTable.
///
/// Layout: `[filter_handle(16)][index_handle(16)][magic(8)]`. Reading it is
/// a single seek + read, after which the filter and index blocks can be
/// located directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Handle to the filter block; `{0, 0}` when no filter is present.
    pub filter_handle: BlockHandle,
    /// Handle to the (required) index block.
    pub index_handle: BlockHandle,
    /// File-type identifier; see [`SSTABLE_MAGIC`].
    pub magic: u64,
}

impl Footer {
    /// Serialized length: two handles plus the magic.
    pub const ENCODED_LEN: usize = 2 * BlockHandle::ENCODED_LEN + 8;

    pub fn new(filter_handle: BlockHandle, index_handle: BlockHandle) -> Self {
        Self {
            filter_handle,
            index_handle,
            magic: SSTABLE_MAGIC,
        }
    }

    /// Appends the 40-byte encoding to `dst`.
    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        self.filter_handle.encode_to(dst);
        self.index_handle.encode_to(dst);
        codec::put_fixed64(dst, self.magic);
    }

    /// Decodes a footer from the front of `input`, consuming exactly
    /// [`Self::ENCODED_LEN`] bytes. No scanning.
    ///
    /// The magic is returned as parsed, **not** validated here — callers that
    /// need the handles for diagnostics can still get them. [`TableReader`]
    /// rejects a mismatching magic as corruption.
    ///
    /// [`TableReader`]: crate::TableReader
    ///
    /// # Errors
    ///
    /// Returns [`Error::Truncated`] if fewer than 40 bytes remain.
    pub fn decode_from(input: &mut &[u8]) -> Result<Self, Error> {
        if input.len() < Self::ENCODED_LEN {
            return Err(Error::Truncated("footer"));
        }
        let filter_handle = BlockHandle::decode_from(input)?;
        let index_handle = BlockHandle::decode_from(input)?;
        let magic = codec::get_fixed64(input).ok_or(Error::Truncated("footer"))?;
        Ok(Self {
            filter_handle,
            index_handle,
            magic,
        })
    }
}
