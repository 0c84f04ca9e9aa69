//! # SSTable — Sorted String Table
//!
//! Immutable, on-disk storage files for the UndertowKV storage engine.
//!
//! When the in-memory [`memtable::SkipList`] fills up, the engine streams it
//! in key order into an SSTable. SSTables are *write-once, read-many* — once
//! created they are never modified, only replaced.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA BLOCKS (restart-based prefix-compressed sorted entries)  │
//! │                                                               │
//! │ entry: shared (u32) | non_shared (u32) | value_len (u32)      │
//! │        key_suffix | value                                     │
//! │ trailer: restart_offsets (u32 each) | num_restarts (u32)      │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX BLOCK (divider key -> data block handle)                │
//! │                                                               │
//! │ entry: klen (varint32) | divider | BlockHandle (16)           │
//! │ trailer: entry_offsets (u32 each) | num_entries (u32)         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FILTER BLOCK (serialized bloom filter over every key)         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always the last 40 bytes)                             │
//! │                                                               │
//! │ filter_handle (16) | index_handle (16) | magic (u64)          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. A reader seeks to the final 40 bytes,
//! decodes the footer, slices the index block through `index_handle`, and
//! routes each lookup `filter -> index -> data block`. Within a data block,
//! restart points (entries storing their key in full) support binary search;
//! the run between two restarts is scanned linearly while reconstructing
//! prefix-compressed keys.

mod block;
mod error;
mod format;
mod index;
mod reader;
mod writer;

pub use block::{DataBlockBuilder, DataBlockReader, DEFAULT_RESTART_INTERVAL};
pub use error::Error;
pub use format::{BlockHandle, Footer, SSTABLE_FILE_EXTENSION, SSTABLE_MAGIC};
pub use index::{IndexBlockBuilder, IndexBlockReader};
pub use reader::TableReader;
pub use writer::{
    write_from_memtable, write_memtable_with, TableBuilder, TableOptions, DEFAULT_BLOCK_SIZE,
};

#[cfg(test)]
mod tests;
