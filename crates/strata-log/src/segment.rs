//! Segment: one store and one index under a shared base offset.
//!
//! The segment translates absolute offsets into store positions. Appends
//! write the payload to the store and record its position in the index;
//! reads look the position up in the index and fetch the payload from the
//! store.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_types::Offset;

use crate::config::SegmentConfig;
use crate::error::Result;
use crate::index::Index;
use crate::record::Record;
use crate::store::Store;

/// A bounded pair of store and index files holding a contiguous offset
/// range starting at `base_offset`.
///
/// # Invariants
///
/// - `next_offset >= base_offset`
/// - `next_offset - base_offset` equals the number of index entries
/// - Index entry `k` holds relative offset `k` and the position of the
///   `k`-th store entry
pub(crate) struct Segment {
    store: Arc<Store>,
    index: Index,
    base_offset: Offset,
    next_offset: Offset,
    store_path: PathBuf,
    index_path: PathBuf,
    config: SegmentConfig,
}

impl Segment {
    /// Opens or creates the segment with the given base offset in `dir`.
    ///
    /// Calling this on an existing on-disk segment recovers its prior
    /// state: `next_offset` is derived from the last index entry, so
    /// bootstrap is idempotent.
    pub(crate) fn new(dir: &Path, base_offset: Offset, config: SegmentConfig) -> Result<Self> {
        let store_path = dir.join(format!("{base_offset}.store"));
        let store_file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&store_path)?;
        let store = Arc::new(Store::new(store_file)?);

        let index_path = dir.join(format!("{base_offset}.index"));
        let index_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&index_path)?;
        let index = Index::new(index_file, index_path.clone(), &config)?;

        let next_offset = if index.is_empty() {
            base_offset
        } else {
            let (last_rel, _) = index.read(-1)?;
            base_offset + Offset::from(last_rel as u64 + 1)
        };

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            store_path,
            index_path,
            config,
        })
    }

    /// Appends a record, returning the offset it was assigned.
    ///
    /// The store write must succeed before the index write. If the index
    /// write fails the store carries a dangling payload; it is unreachable
    /// by offset and the error is surfaced to the caller.
    pub(crate) fn append(&mut self, mut record: Record) -> Result<Offset> {
        let offset = self.next_offset;
        record.offset = offset;

        let (_, position) = self.store.append(&record.to_bytes())?;
        self.index
            .write((offset - self.base_offset).as_u64() as u32, position)?;

        self.next_offset += Offset::from(1u64);
        Ok(offset)
    }

    /// Reads the record at the given absolute offset.
    pub(crate) fn read(&self, offset: Offset) -> Result<Record> {
        let rel = (offset - self.base_offset).as_u64() as i64;
        let (_, position) = self.index.read(rel)?;
        let data = self.store.read(position)?;
        Record::from_bytes(data)
    }

    /// Returns `true` if either the store or the index has reached its
    /// configured maximum.
    ///
    /// Both checks matter: a few large records fill the store first, many
    /// small records fill the index first.
    pub(crate) fn is_maxed(&self) -> Result<bool> {
        Ok(self.store.size()? >= self.config.max_store_bytes
            || self.index.size() >= self.config.max_index_bytes)
    }

    pub(crate) fn base_offset(&self) -> Offset {
        self.base_offset
    }

    /// The offset the next appended record will receive.
    pub(crate) fn next_offset(&self) -> Offset {
        self.next_offset
    }

    /// Returns `true` if `offset` falls within this segment's range.
    pub(crate) fn contains(&self, offset: Offset) -> bool {
        self.base_offset <= offset && offset < self.next_offset
    }

    /// Returns a handle to the segment's store for raw byte streaming.
    pub(crate) fn store(&self) -> Arc<Store> {
        Arc::clone(&self.store)
    }

    /// Closes the segment and deletes both of its files.
    pub(crate) fn remove(self) -> Result<()> {
        let store_path = self.store_path.clone();
        let index_path = self.index_path.clone();

        self.close()?;
        fs::remove_file(index_path)?;
        fs::remove_file(store_path)?;

        Ok(())
    }

    /// Closes the index (with its truncate-and-sync discipline), then the
    /// store (with its buffer flush).
    pub(crate) fn close(self) -> Result<()> {
        self.index.close()?;
        self.store.close()?;
        Ok(())
    }
}
