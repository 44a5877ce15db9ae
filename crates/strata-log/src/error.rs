//! Error types for log operations.

use std::io;

use strata_types::Offset;

/// Errors that can occur while operating on the log.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    /// Filesystem I/O error.
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),

    /// A read past the end of the data, a write into a full index, or a
    /// truncated record.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// No segment covers the requested offset.
    #[error("offset out of range: {0}")]
    OffsetOutOfRange(Offset),

    /// The log's segments have already been released by close or remove.
    #[error("log is closed")]
    Closed,

    /// A lock was poisoned by a thread that panicked while holding it.
    #[error("lock poisoned")]
    LockPoisoned,
}

/// Result alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
