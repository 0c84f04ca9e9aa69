//! Table reading: footer -> index -> data block routing for point lookups.

use anyhow::{bail, Context, Result};
use bloom::BloomFilter;
use std::path::Path;
use vfs::{FileManager, StdFileManager};

use crate::block::DataBlockReader;
use crate::format::{BlockHandle, Footer, SSTABLE_MAGIC};
use crate::index::IndexBlockReader;

/// Reads an SSTable for point lookups.
///
/// On open, the whole file image is read into memory, the footer is decoded
/// from the final 40 bytes, and the bloom filter (if present) is
/// deserialized. A mismatching footer magic or an out-of-range handle makes
/// the file unopenable — the engine treats such tables as corrupt.
///
/// Lookups route `filter -> index -> data block`; the returned value slices
/// borrow the reader's file image.
pub struct TableReader {
    image: Vec<u8>,
    footer: Footer,
    filter: Option<BloomFilter>,
}

impl TableReader {
    /// Opens a table file with the default file manager.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(&StdFileManager, path.as_ref())
    }

    /// Opens a table file through an explicit [`FileManager`].
    pub fn open_with(fm: &dyn FileManager, path: &Path) -> Result<Self> {
        let mut file = fm
            .new_readable(path)
            .with_context(|| format!("open {}", path.display()))?;
        let image = vfs::read_all(file.as_mut())
            .with_context(|| format!("read {}", path.display()))?;
        file.close()?;
        Self::from_bytes(image)
    }

    /// Constructs a reader over an in-memory file image.
    ///
    /// # Errors
    ///
    /// Fails when the image is smaller than a footer, the footer magic does
    /// not match, a footer handle points outside the file, or the filter
    /// block does not deserialize.
    pub fn from_bytes(image: Vec<u8>) -> Result<Self> {
        if image.len() < Footer::ENCODED_LEN {
            bail!("file too small to contain a footer");
        }

        let mut tail = &image[image.len() - Footer::ENCODED_LEN..];
        let footer = Footer::decode_from(&mut tail)?;
        if footer.magic != SSTABLE_MAGIC {
            bail!("bad table magic {:#018x}", footer.magic);
        }

        let file_size = image.len() as u64;
        check_handle(footer.filter_handle, file_size, "filter")?;
        check_handle(footer.index_handle, file_size, "index")?;
        if footer.index_handle.size == 0 {
            bail!("missing index block");
        }

        let filter = if footer.filter_handle.size > 0 {
            let bytes = slice_block(&image, footer.filter_handle);
            Some(BloomFilter::deserialize(bytes).context("filter block")?)
        } else {
            None
        };

        Ok(Self {
            image,
            footer,
            filter,
        })
    }

    /// Point lookup. Returns `Ok(None)` when the key is definitely absent;
    /// the filter short-circuits most misses without touching the index.
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        if !self.may_contain(key) {
            return Ok(None);
        }

        let index = IndexBlockReader::new(self.block(self.footer.index_handle))?;
        let handle = match index.find(key)? {
            Some(h) => h,
            None => return Ok(None),
        };

        // The handle came from block contents, not the validated footer.
        check_handle(handle, self.image.len() as u64, "data")?;

        let data = DataBlockReader::new(self.block(handle))?;
        Ok(data.get(key)?)
    }

    /// Filter check only: `false` means the key is definitely not present.
    /// Tables without a filter block answer `true` for every key.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.filter.as_ref().map_or(true, |f| f.might_contain(key))
    }

    /// Returns `true` if the table embeds a bloom filter.
    #[must_use]
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// The decoded file footer.
    #[must_use]
    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Total size of the file image in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.image.len()
    }

    fn block(&self, handle: BlockHandle) -> &[u8] {
        slice_block(&self.image, handle)
    }
}

/// Slices a validated handle out of the file image.
fn slice_block(image: &[u8], handle: BlockHandle) -> &[u8] {
    &image[handle.offset as usize..(handle.offset + handle.size) as usize]
}

fn check_handle(handle: BlockHandle, file_size: u64, what: &str) -> Result<()> {
    let end = handle
        .offset
        .checked_add(handle.size)
        .with_context(|| format!("{} handle overflows", what))?;
    if end > file_size {
        bail!("{} handle out of range", what);
    }
    Ok(())
}
