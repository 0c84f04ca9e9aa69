//! # WAL — Write-Ahead Log
//!
//! Provides crash-safe durability for the UndertowKV storage engine.
//!
//! Every transactional operation is serialized into a binary frame and
//! appended to the log **before** the corresponding in-memory update. On
//! restart the log is replayed from the head to reconstruct state; a frame is
//! either returned intact (CRC-validated) or recovery stops before it, so a
//! partially written tail is never observed as data.
//!
//! ## Binary frame format
//!
//! ```text
//! [len: u32 LE][crc32: u32 LE][payload bytes of length len]
//! payload = [txn_id: u64][type: u8][klen: varint32][vlen: varint32][key][value]
//! ```
//!
//! The CRC32 covers the payload only. `BEGIN`/`COMMIT`/`ABORT` frames carry
//! empty key and value, `DELETE` carries a key only, and `PUT` carries both —
//! conventions the engine enforces; the codec does not.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::{WalReader, WalRecord, WalWriter};
//!
//! let mut w = WalWriter::create("undertow.wal", true).unwrap();
//! w.append(&WalRecord::begin(1)).unwrap();
//! w.append(&WalRecord::put(1, b"hello", b"world")).unwrap();
//! w.append(&WalRecord::commit(1)).unwrap();
//! drop(w);
//!
//! let reader = WalReader::open("undertow.wal").unwrap();
//! reader.replay(|rec| println!("{:?}", rec)).unwrap();
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use thiserror::Error;

/// Fixed frame header size: `len(4) + crc32(4)`.
pub const FRAME_HEADER_LEN: usize = 8;

/// Discriminant of a WAL record, stored as a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// Opens a transaction.
    BeginTx = 0,
    /// Writes a key-value pair.
    Put = 1,
    /// Deletes a key.
    Delete = 2,
    /// Commits a transaction.
    CommitTx = 3,
    /// Abandons a transaction.
    AbortTx = 4,
}

impl RecordType {
    fn from_u8(v: u8) -> Option<RecordType> {
        match v {
            0 => Some(RecordType::BeginTx),
            1 => Some(RecordType::Put),
            2 => Some(RecordType::Delete),
            3 => Some(RecordType::CommitTx),
            4 => Some(RecordType::AbortTx),
            _ => None,
        }
    }
}

/// A single WAL record: one transactional operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    /// Transaction the operation belongs to.
    pub txn_id: u64,
    /// Operation discriminant.
    pub record_type: RecordType,
    /// The lookup key (empty for BEGIN/COMMIT/ABORT).
    pub key: Vec<u8>,
    /// The payload value (empty for everything but PUT).
    pub value: Vec<u8>,
}

impl WalRecord {
    /// A `BEGIN_TX` record for `txn_id`.
    pub fn begin(txn_id: u64) -> Self {
        Self::control(txn_id, RecordType::BeginTx)
    }

    /// A `PUT` record carrying a key-value pair.
    pub fn put(txn_id: u64, key: &[u8], value: &[u8]) -> Self {
        Self {
            txn_id,
            record_type: RecordType::Put,
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    /// A `DELETE` record carrying the key to remove.
    pub fn delete(txn_id: u64, key: &[u8]) -> Self {
        Self {
            txn_id,
            record_type: RecordType::Delete,
            key: key.to_vec(),
            value: Vec::new(),
        }
    }

    /// A `COMMIT_TX` record for `txn_id`.
    pub fn commit(txn_id: u64) -> Self {
        Self::control(txn_id, RecordType::CommitTx)
    }

    /// An `ABORT_TX` record for `txn_id`.
    pub fn abort(txn_id: u64) -> Self {
        Self::control(txn_id, RecordType::AbortTx)
    }

    fn control(txn_id: u64, record_type: RecordType) -> Self {
        Self {
            txn_id,
            record_type,
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Serializes the payload (everything after the frame header).
    pub fn serialize_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.key.len() + self.value.len());
        codec::put_fixed64(&mut out, self.txn_id);
        out.push(self.record_type as u8);
        codec::put_varint32(&mut out, self.key.len() as u32);
        codec::put_varint32(&mut out, self.value.len() as u32);
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.value);
        out
    }

    /// Serializes the full on-disk frame (header + payload) into `out`.
    pub fn serialize_frame_into(&self, out: &mut Vec<u8>) {
        let payload = self.serialize_payload();
        codec::put_fixed32(out, payload.len() as u32);
        codec::put_fixed32(out, codec::crc32(&payload));
        out.extend_from_slice(&payload);
    }

    /// Serializes the full on-disk frame (header + payload).
    pub fn serialize_frame(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.serialize_frame_into(&mut out);
        out
    }
}

/// Errors that can occur while writing or parsing the log.
#[derive(Debug, Error)]
pub enum WalError {
    /// Normal end-of-stream: a parse was attempted on an empty view.
    #[error("end of log")]
    Exhausted,

    /// The input ends before the declared frame length.
    #[error("truncated {0}")]
    Truncated(&'static str),

    /// The declared length was satisfied but the payload CRC did not match.
    #[error("corrupt frame: crc mismatch")]
    Corrupt,

    /// The payload violates the record encoding.
    #[error("malformed payload: {0}")]
    Malformed(&'static str),

    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Parses one frame from the front of `input`, advancing it by `8 + len`
/// bytes on success.
///
/// # Errors
///
/// - [`WalError::Exhausted`] — `input` is empty (clean end of log).
/// - [`WalError::Truncated`] — fewer bytes than the header or the declared
///   payload length require.
/// - [`WalError::Corrupt`] — the payload CRC does not match.
/// - [`WalError::Malformed`] — the payload violates the record encoding
///   (short fixed fields, bad varint, missing key/value bytes, unknown type).
///
/// On error, `input` is left unchanged so the caller can decide how to
/// terminate recovery.
pub fn parse_frame(input: &mut &[u8]) -> Result<WalRecord, WalError> {
    if input.is_empty() {
        return Err(WalError::Exhausted);
    }
    if input.len() < FRAME_HEADER_LEN {
        return Err(WalError::Truncated("frame header"));
    }

    let mut view = *input;
    let len = codec::get_fixed32(&mut view).ok_or(WalError::Truncated("frame header"))? as usize;
    let crc = codec::get_fixed32(&mut view).ok_or(WalError::Truncated("frame header"))?;
    if view.len() < len {
        return Err(WalError::Truncated("frame payload"));
    }

    let payload = &view[..len];
    if codec::crc32(payload) != crc {
        return Err(WalError::Corrupt);
    }

    let record = parse_payload(payload)?;
    *input = &view[len..];
    Ok(record)
}

/// Decodes a CRC-validated payload into a record.
fn parse_payload(mut payload: &[u8]) -> Result<WalRecord, WalError> {
    let txn_id = codec::get_fixed64(&mut payload).ok_or(WalError::Malformed("missing txn id"))?;

    let (&type_byte, rest) = payload
        .split_first()
        .ok_or(WalError::Malformed("missing record type"))?;
    payload = rest;
    let record_type =
        RecordType::from_u8(type_byte).ok_or(WalError::Malformed("unknown record type"))?;

    let klen =
        codec::get_varint32(&mut payload).ok_or(WalError::Malformed("bad key length"))? as usize;
    let vlen =
        codec::get_varint32(&mut payload).ok_or(WalError::Malformed("bad value length"))? as usize;
    if payload.len() < klen + vlen {
        return Err(WalError::Malformed("truncated key/value bytes"));
    }

    Ok(WalRecord {
        txn_id,
        record_type,
        key: payload[..klen].to_vec(),
        value: payload[klen..klen + vlen].to_vec(),
    })
}

/// Append-only WAL writer.
///
/// Frames are serialized into a reusable scratch buffer and written to the
/// underlying file in a single `write_all` call, so a frame is never split
/// across writes at this layer. When `sync` is `true`, every append is
/// followed by `sync_all()` (fsync) before the call returns.
pub struct WalWriter {
    file: File,
    sync: bool,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    ///
    /// # Arguments
    ///
    /// * `path` — file system path for the log (created if absent).
    /// * `sync` — if `true`, every `append` call is followed by fsync.
    pub fn create<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, WalError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            sync,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes `record` and appends its frame to the log.
    pub fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        self.buf.clear();
        record.serialize_frame_into(&mut self.buf);

        self.file.write_all(&self.buf)?;
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Forces all written frames to durable storage via `sync_all()`.
    ///
    /// Useful when `sync` is `false` (batched mode) and the caller wants
    /// durability at a specific point, e.g. before acknowledging a commit.
    pub fn sync_to_disk(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Sequential WAL reader.
///
/// The log image is held in memory and consumed frame by frame with
/// [`parse_frame`]. A truncated tail (from a crash mid-write) is treated as a
/// clean end of log — every complete frame before it is still replayed. A CRC
/// mismatch or malformed payload stops replay with an error at the affected
/// frame; frames beyond it are unreachable.
pub struct WalReader {
    data: Vec<u8>,
}

impl WalReader {
    /// Opens an existing log file and reads its image.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self { data })
    }

    /// Constructs a reader over an in-memory log image (useful in tests).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Replays every complete frame from the head of the log, calling
    /// `apply` for each record in file order.
    ///
    /// # Termination
    ///
    /// - Clean end of log, or a truncated trailing frame: returns `Ok(())`
    ///   after applying all complete frames before it.
    /// - CRC mismatch or malformed payload: returns the error; recovery
    ///   halts at the last successfully parsed frame.
    pub fn replay<F>(&self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(WalRecord),
    {
        let mut view = self.data.as_slice();
        loop {
            match parse_frame(&mut view) {
                Ok(record) => apply(record),
                Err(WalError::Exhausted) | Err(WalError::Truncated(_)) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}
