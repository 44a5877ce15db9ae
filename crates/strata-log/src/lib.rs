//! strata-log: Persistent, segmented commit log for Strata
//!
//! This crate implements a durable, totally-ordered sequence of opaque byte
//! records identified by monotonically increasing 64-bit offsets. Records
//! are stored in bounded segments, each a pair of files: an append-only
//! store holding the record payloads and a memory-mapped index mapping
//! relative offsets to byte positions in the store.
//!
//! # Record Format
//!
//! Each store entry is a length-prefixed encoded record:
//! ```text
//! [len:u64][offset:u64][value:bytes]
//!    8B        8B        variable
//! ```
//!
//! Each index entry is fixed-width:
//! ```text
//! [rel_offset:u32][position:u64]
//!       4B             8B
//! ```
//!
//! - **len**: Size of the encoded record in bytes
//! - **offset**: The logical position of the record in the log
//! - **`rel_offset`**: Record offset relative to the segment's base offset
//! - **position**: Byte position of the entry's length prefix in the store
//!
//! All integers are big-endian.
//!
//! # File Layout
//!
//! ```text
//! {dir}/
//!   0.store       <- first segment's record payloads
//!   0.index       <- first segment's offset index
//!   14.store      <- next segment, named by its base offset
//!   14.index
//! ```
//!
//! While a segment is live its index file is pre-sized to the configured
//! maximum; a clean close truncates it back to the bytes in use so the next
//! open can recover its state from the physical file size.
//!
//! # Example
//!
//! ```ignore
//! use strata_log::{Config, Log, Record};
//! use bytes::Bytes;
//!
//! let log = Log::new("/data/strata", Config::default())?;
//!
//! let offset = log.append(Record::new(Bytes::from("event-1")))?;
//! let record = log.read(offset)?;
//! assert_eq!(record.value().as_ref(), b"event-1");
//! ```

// Modules
mod config;
mod error;
mod index;
mod log;
mod record;
mod segment;
mod store;

// Re-exports
pub use config::{Config, SegmentConfig};
pub use error::{LogError, Result};
pub use log::{Log, LogReader};
pub use record::Record;
pub use strata_types::Offset;
