//! Log configuration.

use serde::{Deserialize, Serialize};

/// Default byte budget for a segment's store and index.
pub(crate) const DEFAULT_MAX_BYTES: u64 = 1024;

/// Configuration for a log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Config {
    pub segment: SegmentConfig,
}

/// Size limits and the starting offset for a log's segments.
///
/// A zero value for either byte field means "use the default" (1024). The
/// substitution happens once, when the log is constructed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Maximum size of a segment's store file in bytes.
    pub max_store_bytes: u64,
    /// Maximum size of a segment's index file in bytes.
    pub max_index_bytes: u64,
    /// Offset assigned to the first record of a fresh log.
    pub initial_offset: u64,
}

impl Config {
    /// Returns the config with zero-valued byte limits replaced by defaults.
    pub(crate) fn with_defaults(mut self) -> Self {
        if self.segment.max_store_bytes == 0 {
            self.segment.max_store_bytes = DEFAULT_MAX_BYTES;
        }
        if self.segment.max_index_bytes == 0 {
            self.segment.max_index_bytes = DEFAULT_MAX_BYTES;
        }
        self
    }
}
