//! Disk layer errors.

use std::io;

use strata_common::PageId;
use thiserror::Error;

/// Result type for disk operations.
pub type DiskResult<T> = Result<T, DiskError>;

/// Errors that can occur in the disk manager.
#[derive(Debug, Error)]
pub enum DiskError {
    /// Underlying file I/O failed.
    #[error("I/O error: {source}")]
    Io {
        /// The originating error.
        #[from]
        source: io::Error,
    },

    /// A page's slot lies beyond the end of the database file.
    #[error("page {page_id} slot at offset {offset} lies outside the file (len {file_len})")]
    SlotOutOfBounds {
        /// The page whose slot was out of range.
        page_id: PageId,
        /// Byte offset of the slot.
        offset: u64,
        /// Current length of the database file.
        file_len: u64,
    },

    /// A log read started beyond the end of the log file.
    #[error("log read of {len} bytes at offset {offset} past end of log (len {log_len})")]
    LogOutOfBounds {
        /// Requested read offset.
        offset: u64,
        /// Requested read length.
        len: usize,
        /// Current length of the log file.
        log_len: u64,
    },
}
