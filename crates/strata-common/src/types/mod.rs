//! Core types for StrataDB.

mod ids;

pub use ids::{FrameId, PageId};

use crate::constants::PAGE_SIZE;

/// A heap-allocated page buffer.
///
/// Frames own one of these for the lifetime of the pool; the disk layer
/// fills and drains them in `PAGE_SIZE` units.
pub type PageBuf = Box<[u8; PAGE_SIZE]>;

/// Allocates a zeroed page buffer.
#[must_use]
pub fn zeroed_page() -> PageBuf {
    Box::new([0u8; PAGE_SIZE])
}
