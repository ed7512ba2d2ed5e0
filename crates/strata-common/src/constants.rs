//! System-wide constants for StrataDB.

/// Size of a database page in bytes.
///
/// This is the unit of transfer between the buffer pool and the disk
/// manager, and the only value that must agree between the two.
pub const PAGE_SIZE: usize = 4096;

/// Initial number of page slots the disk manager pre-sizes its file for.
///
/// The file grows by doubling once the slots are exhausted.
pub const DEFAULT_DISK_CAPACITY: usize = 16;

/// Default number of frames in a buffer pool.
pub const DEFAULT_POOL_FRAMES: usize = 1024;
