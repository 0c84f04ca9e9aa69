//! # VFS — file I/O capabilities
//!
//! The narrow boundary through which UndertowKV's storage layers persist
//! bytes. The core depends only on these traits, never on a platform API:
//!
//! - [`WritableFile`] — sequential append, flush, durable sync, close.
//! - [`ReadableFile`] — sequential read, close.
//! - [`FileManager`] — create/truncate, open, exists, delete, rename.
//!
//! [`StdFileManager`] is the default realization on top of `std::fs`, which
//! already papers over the POSIX/Windows split. Tests can substitute their
//! own implementations (e.g. failure injection) without touching the callers.
//!
//! Handles are exclusive and not thread-safe; callers synchronize any
//! external sharing. `close` is explicit, but dropping a handle releases the
//! underlying resources on every exit path.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// Chunk size used by [`read_all`].
const READ_CHUNK: usize = 64 * 1024;

/// A file that can be written to sequentially.
///
/// Implementations append at the end of the file and are responsible for
/// completing partial writes. After [`close`](WritableFile::close), further
/// writes must fail.
pub trait WritableFile {
    /// Appends `data` to the end of the file, looping over partial writes.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flushes user-space buffers to the operating system.
    fn flush(&mut self) -> io::Result<()>;

    /// Durably persists written data to the storage medium. A stronger
    /// guarantee than [`flush`](WritableFile::flush).
    fn sync(&mut self) -> io::Result<()>;

    /// Closes the file. Subsequent writes fail.
    fn close(&mut self) -> io::Result<()>;
}

/// A file that can be read from sequentially.
pub trait ReadableFile {
    /// Reads up to `n` bytes, appending them to `out`, and returns the number
    /// of bytes read. Returns 0 at end-of-file and after
    /// [`close`](ReadableFile::close).
    fn read(&mut self, n: usize, out: &mut Vec<u8>) -> io::Result<usize>;

    /// Closes the file. Subsequent reads return 0.
    fn close(&mut self) -> io::Result<()>;
}

/// File-system operations the storage layers need from the platform.
pub trait FileManager {
    /// Creates a new writable file, truncating any existing contents.
    fn new_writable(&self, path: &Path) -> io::Result<Box<dyn WritableFile>>;

    /// Opens an existing file for sequential reading.
    fn new_readable(&self, path: &Path) -> io::Result<Box<dyn ReadableFile>>;

    /// Returns `true` if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Deletes a file. Idempotent: deleting an absent file succeeds.
    fn delete(&self, path: &Path) -> io::Result<()>;

    /// Renames `src` to `dst`, replacing `dst` if it exists.
    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// Drains a readable file to its end and returns the bytes.
pub fn read_all(file: &mut dyn ReadableFile) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let n = file.read(READ_CHUNK, &mut out)?;
        if n == 0 {
            return Ok(out);
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "file is closed")
}

// ---------------- std::fs realization ----------------

/// [`WritableFile`] backed by `std::fs::File`.
///
/// Writes go straight to the OS (no user-space buffering), so
/// [`flush`](WritableFile::flush) is cheap and [`sync`](WritableFile::sync)
/// maps to `fsync`.
pub struct StdWritableFile {
    file: Option<File>,
}

impl WritableFile for StdWritableFile {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        match &mut self.file {
            Some(f) => f.write_all(data),
            None => Err(closed_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(f) => f.flush(),
            None => Err(closed_error()),
        }
    }

    fn sync(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(f) => f.sync_all(),
            None => Err(closed_error()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the handle closes it; close is idempotent.
        self.file.take();
        Ok(())
    }
}

/// [`ReadableFile`] backed by `std::fs::File`.
pub struct StdReadableFile {
    file: Option<File>,
}

impl ReadableFile for StdReadableFile {
    fn read(&mut self, n: usize, out: &mut Vec<u8>) -> io::Result<usize> {
        let file = match &mut self.file {
            Some(f) => f,
            None => return Ok(0),
        };
        let start = out.len();
        out.resize(start + n, 0);
        let mut filled = 0;
        while filled < n {
            match file.read(&mut out[start + filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    out.truncate(start);
                    return Err(e);
                }
            }
        }
        out.truncate(start + filled);
        Ok(filled)
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.take();
        Ok(())
    }
}

/// Default [`FileManager`] on top of `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileManager;

impl FileManager for StdFileManager {
    fn new_writable(&self, path: &Path) -> io::Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(StdWritableFile { file: Some(file) }))
    }

    fn new_readable(&self, path: &Path) -> io::Result<Box<dyn ReadableFile>> {
        let file = File::open(path)?;
        Ok(Box::new(StdReadableFile { file: Some(file) }))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()> {
        fs::rename(src, dst)
    }
}
