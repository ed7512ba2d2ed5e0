//! # strata-storage
//!
//! The StrataDB storage core: a page-oriented buffer pool over a
//! file-backed disk manager.
//!
//! The crate is organized in two layers:
//!
//! - [`disk`] — the persistent medium: a slot-allocating page file
//!   ([`disk::DiskManager`]) and a single-worker request scheduler
//!   ([`disk::DiskScheduler`]) that serializes I/O off the callers'
//!   threads.
//! - [`buffer`] — the in-memory cache: fixed-size frames, an adaptive
//!   replacement (ARC) eviction policy, and the
//!   [`buffer::BufferPoolManager`] that hands out pin-counted,
//!   latch-holding page guards.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod disk;
