//! Table assembly: streaming sorted entries into `[data*][index][filter][footer]`.

use anyhow::{bail, Context, Result};
use bloom::BloomFilter;
use memtable::SkipList;
use std::path::Path;
use vfs::{FileManager, StdFileManager, WritableFile};

use crate::block::{DataBlockBuilder, DEFAULT_RESTART_INTERVAL};
use crate::format::{BlockHandle, Footer, SSTABLE_FILE_EXTENSION};
use crate::index::IndexBlockBuilder;

/// Default data block size threshold. A block is cut once its size estimate
/// reaches this value.
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024;

/// Tuning knobs for [`TableBuilder`].
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Data block size threshold in bytes.
    pub block_size: usize,
    /// Entries between restart points within a data block.
    pub restart_interval: usize,
    /// Target false positive rate for the embedded bloom filter.
    pub bloom_false_positive_rate: f64,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            restart_interval: DEFAULT_RESTART_INTERVAL,
            bloom_false_positive_rate: 0.01,
        }
    }
}

/// Streams strictly-increasing entries into an SSTable through a
/// [`WritableFile`].
///
/// Data blocks are written as they fill; each block's first key becomes its
/// divider in the index. [`finish`](Self::finish) appends the index block,
/// the bloom filter built over every added key, and the footer, then flushes
/// and syncs the file.
pub struct TableBuilder {
    file: Box<dyn WritableFile>,
    opts: TableOptions,
    /// Bytes written so far; the offset of the next block.
    offset: u64,
    data_block: DataBlockBuilder,
    index: IndexBlockBuilder,
    /// Keys added so far; sizes the bloom filter exactly at finish time.
    keys: Vec<Vec<u8>>,
    last_key: Vec<u8>,
}

impl TableBuilder {
    pub fn new(file: Box<dyn WritableFile>, opts: TableOptions) -> Self {
        let restart_interval = opts.restart_interval;
        Self {
            file,
            opts,
            offset: 0,
            data_block: DataBlockBuilder::new(restart_interval),
            index: IndexBlockBuilder::new(),
            keys: Vec::new(),
            last_key: Vec::new(),
        }
    }

    /// Appends an entry. Keys must arrive in strictly increasing order
    /// across the whole table, not just within a block.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if !self.keys.is_empty() && self.last_key.as_slice() >= key {
            bail!("keys must be added in strictly increasing order");
        }

        self.data_block.add(key, value)?;
        self.keys.push(key.to_vec());
        self.last_key.clear();
        self.last_key.extend_from_slice(key);

        if self.data_block.current_size_estimate() >= self.opts.block_size {
            self.flush_data_block()?;
        }
        Ok(())
    }

    /// Number of entries added so far.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.keys.len()
    }

    /// Writes the pending data block, index, filter, and footer, then
    /// flushes and syncs the underlying file.
    pub fn finish(mut self) -> Result<()> {
        self.flush_data_block()?;

        let index_block =
            std::mem::replace(&mut self.index, IndexBlockBuilder::new()).finish();
        let index_handle = self.write_block(&index_block)?;

        let mut filter = BloomFilter::new(self.keys.len(), self.opts.bloom_false_positive_rate);
        for key in &self.keys {
            filter.add(key);
        }
        let filter_block = filter.serialize();
        let filter_handle = self.write_block(&filter_block)?;

        let footer = Footer::new(filter_handle, index_handle);
        let mut tail = Vec::with_capacity(Footer::ENCODED_LEN);
        footer.encode_to(&mut tail);
        self.file.write(&tail)?;

        self.file.flush()?;
        self.file.sync()?;
        self.file.close()?;
        Ok(())
    }

    /// Cuts the current data block: writes it out and records its first key
    /// as the divider in the index.
    fn flush_data_block(&mut self) -> Result<()> {
        if self.data_block.is_empty() {
            return Ok(());
        }
        let full = std::mem::replace(
            &mut self.data_block,
            DataBlockBuilder::new(self.opts.restart_interval),
        );
        let divider = full.first_key().to_vec();
        let block = full.finish();
        let handle = self.write_block(&block)?;
        self.index.add(&divider, &handle)?;
        Ok(())
    }

    fn write_block(&mut self, block: &[u8]) -> Result<BlockHandle> {
        let handle = BlockHandle::new(self.offset, block.len() as u64);
        self.file.write(block)?;
        self.offset += block.len() as u64;
        Ok(handle)
    }
}

/// Flushes a memtable to an SSTable at `path` with default options.
///
/// Entries stream out of the skip list in sorted order. The table is written
/// to a temporary sibling file first and atomically renamed into place, so a
/// crash mid-flush never leaves a half-written table under the final name.
pub fn write_from_memtable<P: AsRef<Path>>(path: P, mem: &SkipList) -> Result<()> {
    write_memtable_with(&StdFileManager, path.as_ref(), mem, TableOptions::default())
}

/// [`write_from_memtable`] with an explicit file manager and options.
pub fn write_memtable_with(
    fm: &dyn FileManager,
    path: &Path,
    mem: &SkipList,
    opts: TableOptions,
) -> Result<()> {
    let tmp_path = path.with_extension(format!("{}.tmp", SSTABLE_FILE_EXTENSION));
    let file = fm
        .new_writable(&tmp_path)
        .with_context(|| format!("create {}", tmp_path.display()))?;

    let mut builder = TableBuilder::new(file, opts);
    for (key, value) in mem.iter() {
        builder.add(key, value)?;
    }
    builder.finish()?;

    fm.rename(&tmp_path, path)
        .with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}
