//! Core log: an ordered list of segments behind one reader-writer lock.
//!
//! The [`Log`] owns a directory of segments, routes appends to the active
//! (last) segment, routes reads by offset range, rolls a new segment when
//! the active one reaches its size limits, and truncates the segment prefix
//! on request.
//!
//! # Locking
//!
//! A single `RwLock` guards the segment list and the active segment.
//! `append`, `truncate`, `close`, `remove` and `reset` take it exclusively;
//! `read`, `reader` and the offset queries take it shared. Store-level
//! buffering has its own mutex below this lock.
//!
//! # Recovery
//!
//! Opening a log over an existing directory rebuilds every segment from its
//! on-disk files: base offsets come from the file names, per-segment state
//! from the index contents. A cleanly closed log reopens with identical
//! offsets and contents.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use strata_types::Offset;

use crate::config::Config;
use crate::error::{LogError, Result};
use crate::record::Record;
use crate::segment::Segment;
use crate::store::Store;

struct LogInner {
    /// Segments ordered by strictly increasing base offset. Adjacent
    /// segments meet exactly: the next one's base equals this one's
    /// next offset. The last segment is the active one.
    segments: Vec<Segment>,
}

/// A persistent, append-only, segmented commit log.
///
/// Records are opaque byte payloads identified by the monotonically
/// increasing [`Offset`] assigned at append time. All methods take `&self`;
/// the log is safe to share across threads.
pub struct Log {
    dir: PathBuf,
    config: Config,
    inner: RwLock<LogInner>,
}

impl Log {
    /// Opens or creates a log in `dir`.
    ///
    /// Zero-valued byte limits in the config are replaced with defaults.
    /// Existing segment files are recovered in base-offset order; an empty
    /// directory gets a single segment at the configured initial offset.
    pub fn new(dir: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let dir = dir.into();
        let config = config.with_defaults();

        fs::create_dir_all(&dir)?;
        let segments = load_segments(&dir, &config)?;
        tracing::debug!(dir = %dir.display(), segments = segments.len(), "opened log");

        Ok(Self {
            dir,
            config,
            inner: RwLock::new(LogInner { segments }),
        })
    }

    /// Appends a record, returning the offset it was assigned.
    ///
    /// If the active segment is maxed after the append, a new segment is
    /// rolled at the next offset and becomes active. Appends never fail
    /// because a segment is full.
    pub fn append(&self, record: Record) -> Result<Offset> {
        let mut inner = self.inner.write().map_err(|_| LogError::LockPoisoned)?;

        let active = inner.segments.last_mut().ok_or(LogError::Closed)?;
        let offset = active.append(record)?;

        if active.is_maxed()? {
            let base = offset + Offset::from(1u64);
            tracing::debug!(base_offset = %base, "active segment maxed, rolling new segment");
            let segment = Segment::new(&self.dir, base, self.config.segment)?;
            inner.segments.push(segment);
        }

        Ok(offset)
    }

    /// Reads the record at the given offset.
    ///
    /// # Errors
    ///
    /// [`LogError::OffsetOutOfRange`] if no segment covers the offset.
    pub fn read(&self, offset: Offset) -> Result<Record> {
        let inner = self.inner.read().map_err(|_| LogError::LockPoisoned)?;

        let segment = inner
            .segments
            .iter()
            .find(|s| s.contains(offset))
            .ok_or(LogError::OffsetOutOfRange(offset))?;

        segment.read(offset)
    }

    /// Returns the lowest offset held by the log.
    pub fn lowest_offset(&self) -> Result<Offset> {
        let inner = self.inner.read().map_err(|_| LogError::LockPoisoned)?;
        let first = inner.segments.first().ok_or(LogError::Closed)?;
        Ok(first.base_offset())
    }

    /// Returns the highest offset held by the log.
    ///
    /// An empty log reports 0 by convention.
    pub fn highest_offset(&self) -> Result<Offset> {
        let inner = self.inner.read().map_err(|_| LogError::LockPoisoned)?;
        let last = inner.segments.last().ok_or(LogError::Closed)?;

        let next = last.next_offset();
        if next == Offset::ZERO {
            Ok(Offset::ZERO)
        } else {
            Ok(next - Offset::from(1u64))
        }
    }

    /// Removes every segment whose records are all at or below `lowest`.
    ///
    /// The policy is prefix-only: the surviving list begins with the first
    /// segment still holding offsets greater than `lowest`.
    pub fn truncate(&self, lowest: Offset) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| LogError::LockPoisoned)?;

        while let Some(first) = inner.segments.first() {
            if first.next_offset() > lowest + Offset::from(1u64) {
                break;
            }
            let segment = inner.segments.remove(0);
            tracing::debug!(
                base_offset = %segment.base_offset(),
                lowest = %lowest,
                "removing truncated segment"
            );
            segment.remove()?;
        }

        Ok(())
    }

    /// Returns a reader over the raw store bytes of every segment, in
    /// offset order, length prefixes included.
    ///
    /// Used to snapshot the log or bootstrap a replica. The reader tracks
    /// its stores live: bytes flushed to a store by the time a read call
    /// runs are included, even if they were appended after the reader was
    /// created.
    pub fn reader(&self) -> Result<LogReader> {
        let inner = self.inner.read().map_err(|_| LogError::LockPoisoned)?;

        let readers = inner
            .segments
            .iter()
            .map(|s| OriginReader {
                store: s.store(),
                offset: 0,
            })
            .collect();

        Ok(LogReader {
            readers,
            current: 0,
        })
    }

    /// Flushes and closes every segment.
    ///
    /// The log holds no segments afterwards; later appends fail with
    /// [`LogError::Closed`].
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| LogError::LockPoisoned)?;
        close_segments(&mut inner)
    }

    /// Closes the log and deletes its directory tree.
    pub fn remove(&self) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| LogError::LockPoisoned)?;
        close_segments(&mut inner)?;
        fs::remove_dir_all(&self.dir)?;
        Ok(())
    }

    /// Removes the log's data and sets it up again from scratch.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| LogError::LockPoisoned)?;

        close_segments(&mut inner)?;
        fs::remove_dir_all(&self.dir)?;
        fs::create_dir_all(&self.dir)?;
        inner.segments = load_segments(&self.dir, &self.config)?;

        Ok(())
    }
}

fn close_segments(inner: &mut LogInner) -> Result<()> {
    for segment in inner.segments.drain(..) {
        segment.close()?;
    }
    Ok(())
}

/// Rebuilds the segment list from the directory contents.
///
/// File stems are parsed as base offsets; each segment contributes a
/// `.store` and an `.index` file with the same stem, so the sorted bases
/// are deduplicated before one segment is opened per base.
fn load_segments(dir: &Path, config: &Config) -> Result<Vec<Segment>> {
    let mut base_offsets = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match stem.parse::<u64>() {
            Ok(base) => base_offsets.push(base),
            Err(_) => {
                tracing::debug!(file = %path.display(), "ignoring non-segment file");
            }
        }
    }

    base_offsets.sort_unstable();
    base_offsets.dedup();

    let mut segments = Vec::with_capacity(base_offsets.len().max(1));
    for base in base_offsets {
        segments.push(Segment::new(dir, Offset::new(base), config.segment)?);
    }
    if segments.is_empty() {
        segments.push(Segment::new(
            dir,
            Offset::new(config.segment.initial_offset),
            config.segment,
        )?);
    }

    Ok(segments)
}

/// Streams one store's raw bytes from the beginning.
struct OriginReader {
    store: Arc<Store>,
    offset: u64,
}

impl io::Read for OriginReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self
            .store
            .read_at(buf, self.offset)
            .map_err(|e| match e {
                LogError::Io(e) => e,
                other => io::Error::other(other),
            })?;
        self.offset += n as u64;
        Ok(n)
    }
}

/// A [`std::io::Read`] over the concatenated raw store bytes of a log.
///
/// Each segment's store is read in full before the next begins. The reader
/// observes data flushed by the time each read call runs; it does not block
/// appends.
pub struct LogReader {
    readers: Vec<OriginReader>,
    current: usize,
}

impl io::Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current < self.readers.len() {
            let n = self.readers[self.current].read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            self.current += 1;
        }

        Ok(0)
    }
}
