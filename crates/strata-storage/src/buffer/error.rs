//! Buffer pool errors.

use thiserror::Error;

use crate::disk::DiskError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur inside the fetch-or-load pipeline.
///
/// Only [`BufferError::PoolExhausted`] is an expected condition (it
/// surfaces as `None` from the checked accessors); disk failures are
/// fatal at the pool's public boundary.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Every frame is pinned; nothing can be evicted.
    #[error("no evictable frames available, all pages are pinned")]
    PoolExhausted,

    /// The disk layer failed underneath the pool.
    #[error("disk I/O failed: {source}")]
    Disk {
        /// The originating error.
        #[from]
        source: DiskError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: BufferError = DiskError::from(io).into();
        assert!(matches!(err, BufferError::Disk { .. }));
    }
}
