//! Memory-mapped offset index.
//!
//! The index maps a record's offset, relative to the segment's base offset,
//! to the byte position of its entry in the store.
//!
//! # File Format
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  Offset  │  Size  │  Description                 │
//! ├──────────────────────────────────────────────────┤
//! │  0       │  4     │  Relative offset (u32 BE)    │
//! │  4       │  8     │  Store position (u64 BE)     │
//! │  ...     │  12*N  │  One entry per record        │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Pre-sizing and Recovery
//!
//! The mapping cannot be resized in place, so the file is grown to its
//! configured maximum before it is mapped. The `size` field tracks the
//! logical boundary, not the mapping length. On a clean close the file is
//! truncated back to `size`: the next open derives `size` from the physical
//! file length, and without the truncate the write cursor would land in the
//! zero-filled tail and the last real entry would be unreachable via
//! `read(-1)`.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::config::SegmentConfig;
use crate::error::{LogError, Result};

// Entry field widths. The relative offset is stored as u32 rather than a
// full u64: four bytes per entry adds up over billions of records.
pub(crate) const OFFSET_WIDTH: u64 = 4;
pub(crate) const POSITION_WIDTH: u64 = 8;
pub(crate) const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// Maps relative offsets to store positions through a writable shared
/// memory map over a pre-sized file.
///
/// # Invariants
///
/// - `size` is a multiple of [`ENTRY_WIDTH`] and never exceeds the mapping
///   length
/// - Entry `k` holds relative offset `k`: entries are dense
///
/// The index performs no locking of its own. Only the active segment is
/// written to, and the log's locks already exclude readers during writes.
pub(crate) struct Index {
    file: File,
    mmap: MmapMut,
    size: u64,
    path: PathBuf,
}

impl Index {
    /// Creates an index over the given file, growing it to
    /// `max_index_bytes` before mapping.
    ///
    /// The file's size on entry becomes the index's logical size, so an
    /// index that was truncated on close resumes with its entries intact.
    pub(crate) fn new(file: File, path: PathBuf, config: &SegmentConfig) -> Result<Self> {
        let size = file.metadata()?.len();
        file.set_len(config.max_index_bytes)?;

        // SAFETY: the file is open read/write and outlives the mapping; the
        // data directory is exclusive to this process.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            file,
            mmap,
            size,
            path,
        })
    }

    /// Reads the entry for the given relative offset, returning the stored
    /// `(rel_offset, position)` pair.
    ///
    /// `want == -1` reads the last entry.
    ///
    /// # Errors
    ///
    /// [`LogError::UnexpectedEof`] if the index is empty or `want` is past
    /// the last entry.
    pub(crate) fn read(&self, want: i64) -> Result<(u32, u64)> {
        if self.size == 0 {
            return Err(LogError::UnexpectedEof);
        }

        let rel = if want == -1 {
            ((self.size / ENTRY_WIDTH) - 1) as u32
        } else {
            want as u32
        };

        let pos = rel as u64 * ENTRY_WIDTH;
        if self.size < pos + ENTRY_WIDTH {
            return Err(LogError::UnexpectedEof);
        }

        let pos = pos as usize;
        let rel_offset = u32::from_be_bytes(
            self.mmap[pos..pos + OFFSET_WIDTH as usize]
                .try_into()
                .expect("slice is exactly 4 bytes after bounds check"),
        );
        let position = u64::from_be_bytes(
            self.mmap[pos + OFFSET_WIDTH as usize..pos + ENTRY_WIDTH as usize]
                .try_into()
                .expect("slice is exactly 8 bytes after bounds check"),
        );

        Ok((rel_offset, position))
    }

    /// Appends an entry to the index.
    ///
    /// # Errors
    ///
    /// [`LogError::UnexpectedEof`] if the mapping has no room for another
    /// entry: the index is full and the segment must be rolled.
    pub(crate) fn write(&mut self, rel_offset: u32, position: u64) -> Result<()> {
        if (self.mmap.len() as u64) < self.size + ENTRY_WIDTH {
            return Err(LogError::UnexpectedEof);
        }

        let pos = self.size as usize;
        self.mmap[pos..pos + OFFSET_WIDTH as usize].copy_from_slice(&rel_offset.to_be_bytes());
        self.mmap[pos + OFFSET_WIDTH as usize..pos + ENTRY_WIDTH as usize]
            .copy_from_slice(&position.to_be_bytes());

        self.size += ENTRY_WIDTH;

        debug_assert_eq!(self.size % ENTRY_WIDTH, 0, "size must stay entry-aligned");
        Ok(())
    }

    /// Returns the number of bytes logically in use.
    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` if the index holds no entries.
    pub(crate) fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the path of the index file.
    pub(crate) fn name(&self) -> &Path {
        &self.path
    }

    /// Syncs the mapping and the file, then truncates the file back to the
    /// bytes in logical use.
    ///
    /// The truncate restores the file to exactly its entries, which is what
    /// the next [`Index::new`] reads back as `size`.
    pub(crate) fn close(self) -> Result<()> {
        tracing::debug!(file = %self.name().display(), entries = self.size / ENTRY_WIDTH, "closing index");

        let Index {
            file,
            mmap,
            size,
            path: _,
        } = self;

        mmap.flush_async()?;
        file.sync_all()?;

        // The mapping must be gone before the file shrinks underneath it.
        drop(mmap);
        file.set_len(size)?;

        Ok(())
    }
}
