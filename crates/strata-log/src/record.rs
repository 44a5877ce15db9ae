//! Record type for the commit log.
//!
//! Each record pairs an opaque payload with the offset the log assigned at
//! append time.
//!
//! # Record Format
//!
//! ```text
//! [offset:u64][value:bytes]
//!     8B         variable
//! ```
//!
//! The encoding carries no length of its own: the store's outer length
//! prefix delimits the record on disk.

use bytes::{BufMut, Bytes, BytesMut};
use strata_types::Offset;

use crate::error::{LogError, Result};

/// Width of the encoded offset field in bytes.
const OFFSET_FIELD_WIDTH: usize = 8;

/// A single record in the commit log.
///
/// Records are the unit of append and read. The payload is opaque to the
/// log; the offset is assigned by the log when the record is appended and
/// is stable from then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub(crate) offset: Offset,
    value: Bytes,
}

impl Record {
    /// Creates a record with the given payload.
    ///
    /// The offset is assigned by the log at append time; until then it
    /// reads as zero.
    pub fn new(value: Bytes) -> Self {
        Self {
            offset: Offset::ZERO,
            value,
        }
    }

    /// Returns the offset of this record.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Returns the payload of this record.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Serializes the record to bytes.
    ///
    /// Format: `[offset:u64 BE][value]`.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(OFFSET_FIELD_WIDTH + self.value.len());
        buf.put_u64(self.offset.as_u64());
        buf.put_slice(&self.value);
        buf.freeze()
    }

    /// Deserializes a record from bytes.
    ///
    /// Uses zero-copy slicing for the payload via [`Bytes::slice`].
    ///
    /// # Errors
    ///
    /// [`LogError::UnexpectedEof`] if the data is shorter than the offset
    /// field.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        if data.len() < OFFSET_FIELD_WIDTH {
            return Err(LogError::UnexpectedEof);
        }

        let offset = Offset::new(u64::from_be_bytes(
            data[0..OFFSET_FIELD_WIDTH]
                .try_into()
                .expect("slice is exactly 8 bytes after bounds check"),
        ));
        let value = data.slice(OFFSET_FIELD_WIDTH..);

        Ok(Record { offset, value })
    }
}
