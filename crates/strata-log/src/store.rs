//! Append-only byte store.
//!
//! The store is the bottom layer of a segment: a sequentially written file
//! of length-prefixed record payloads, read back by byte position.
//!
//! # Entry Format
//!
//! ```text
//! [len:u64][payload:bytes]
//!    8B       variable
//! ```
//!
//! Entries are concatenated; the position of an entry is the byte offset of
//! its length prefix. Writes go through a buffer, so reads flush the buffer
//! first.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::{LogError, Result};

/// Width of the length prefix in bytes.
pub(crate) const LEN_WIDTH: u64 = 8;

struct StoreInner {
    writer: BufWriter<File>,
    reader: File,
    size: u64,
}

/// Buffered, append-only byte log with random-access reads.
///
/// All operations are serialized by an internal mutex: reads must flush the
/// write buffer, and the buffer is not thread-safe.
pub(crate) struct Store {
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Creates a store over the given file.
    ///
    /// The file must be open for reading and appending. Its current size
    /// becomes the store's logical size, so an existing file is resumed
    /// where it left off.
    pub(crate) fn new(file: File) -> Result<Self> {
        let size = file.metadata()?.len();
        let reader = file.try_clone()?;
        let writer = BufWriter::new(file);

        Ok(Self {
            inner: Mutex::new(StoreInner {
                writer,
                reader,
                size,
            }),
        })
    }

    /// Appends a payload, returning the number of bytes written (prefix
    /// included) and the position of the entry's length prefix.
    pub(crate) fn append(&self, payload: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock().map_err(|_| LogError::LockPoisoned)?;

        let position = inner.size;
        inner
            .writer
            .write_all(&(payload.len() as u64).to_be_bytes())?;
        inner.writer.write_all(payload)?;

        let written = LEN_WIDTH + payload.len() as u64;
        inner.size += written;

        Ok((written, position))
    }

    /// Reads the entry whose length prefix starts at `position`.
    ///
    /// # Errors
    ///
    /// [`LogError::UnexpectedEof`] if `position` does not address a complete
    /// entry within the store's logical size.
    pub(crate) fn read(&self, position: u64) -> Result<Bytes> {
        let mut inner = self.inner.lock().map_err(|_| LogError::LockPoisoned)?;
        inner.writer.flush()?;

        if position + LEN_WIDTH > inner.size {
            return Err(LogError::UnexpectedEof);
        }

        let mut len_buf = [0u8; LEN_WIDTH as usize];
        inner.reader.seek(SeekFrom::Start(position))?;
        inner.reader.read_exact(&mut len_buf)?;
        let len = u64::from_be_bytes(len_buf);

        if position + LEN_WIDTH + len > inner.size {
            return Err(LogError::UnexpectedEof);
        }

        let mut payload = vec![0u8; len as usize];
        inner.reader.read_exact(&mut payload)?;

        Ok(payload.into())
    }

    /// Reads raw store bytes at `offset` into `buf`, returning the number
    /// of bytes read. Zero means end of store.
    ///
    /// Callers that stream store bytes without decoding (replication,
    /// snapshots) use this instead of [`Store::read`].
    pub(crate) fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut inner = self.inner.lock().map_err(|_| LogError::LockPoisoned)?;
        inner.writer.flush()?;

        if offset >= inner.size {
            return Ok(0);
        }
        let max = buf.len().min((inner.size - offset) as usize);

        inner.reader.seek(SeekFrom::Start(offset))?;
        let n = inner.reader.read(&mut buf[..max])?;
        Ok(n)
    }

    /// Returns the store's logical size in bytes.
    pub(crate) fn size(&self) -> Result<u64> {
        let inner = self.inner.lock().map_err(|_| LogError::LockPoisoned)?;
        Ok(inner.size)
    }

    /// Flushes the buffer and syncs the file to stable storage.
    ///
    /// The file handles are released when the store is dropped.
    pub(crate) fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| LogError::LockPoisoned)?;

        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;

        Ok(())
    }
}
