//! Buffer frame - a slot in the buffer pool that holds one page.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use strata_common::types::zeroed_page;
use strata_common::{FrameId, PageBuf};

/// Per-frame resident state.
///
/// Each frame owns:
/// - the page buffer, behind a reader/writer lock that page guards hold
///   for their whole lifetime (many readers XOR one writer)
/// - an atomic pin count (outstanding guards)
/// - a dirty flag (buffer differs from durable storage)
///
/// The buffer sits behind its own `Arc` so that guards can hold owned
/// lock guards and the disk scheduler can fill it on a miss.
pub struct FrameHeader {
    frame_id: FrameId,
    data: Arc<RwLock<PageBuf>>,
    pin_count: AtomicU32,
    dirty: AtomicBool,
}

impl FrameHeader {
    /// Creates an empty, zeroed frame.
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            data: Arc::new(RwLock::new(zeroed_page())),
            pin_count: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Returns the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Returns the page buffer handle.
    #[inline]
    pub(crate) fn data(&self) -> &Arc<RwLock<PageBuf>> {
        &self.data
    }

    /// Snapshots the page buffer under a shared lock.
    pub(crate) fn copy_data(&self) -> PageBuf {
        PageBuf::clone(&self.data.read())
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Increments the pin count and returns the new value.
    ///
    /// Transitions across zero must happen under the pool mutex so they
    /// stay atomic with the replacer's evictability bookkeeping.
    #[inline]
    pub(crate) fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrements the pin count and returns the new value.
    ///
    /// # Panics
    ///
    /// Panics if the pin count is already 0.
    #[inline]
    pub(crate) fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        assert!(old > 0, "pin count underflow on frame {}", self.frame_id);
        old - 1
    }

    /// Returns true if any guard is outstanding on this frame.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Returns true if the buffer has unflushed modifications.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Sets or clears the dirty flag.
    #[inline]
    pub(crate) fn set_dirty(&self, dirty: bool) {
        self.dirty.store(dirty, Ordering::Release);
    }

    /// Returns the frame to its pristine state: zeroed buffer, clean,
    /// unpinned.
    pub(crate) fn reset(&self) {
        self.data.write().fill(0);
        self.pin_count.store(0, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("frame_id", &self.frame_id)
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = FrameHeader::new(FrameId::new(0));
        assert_eq!(frame.frame_id(), FrameId::new(0));
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_pinned());
        assert!(!frame.is_dirty());
        assert!(frame.data().read().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pin_unpin() {
        let frame = FrameHeader::new(FrameId::new(0));

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert!(frame.is_pinned());

        assert_eq!(frame.unpin(), 1);
        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    #[should_panic(expected = "pin count underflow")]
    fn test_unpin_underflow_panics() {
        let frame = FrameHeader::new(FrameId::new(0));
        frame.unpin();
    }

    #[test]
    fn test_dirty_flag() {
        let frame = FrameHeader::new(FrameId::new(0));
        frame.set_dirty(true);
        assert!(frame.is_dirty());
        frame.set_dirty(false);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_reset() {
        let frame = FrameHeader::new(FrameId::new(0));
        frame.pin();
        frame.set_dirty(true);
        frame.data().write()[0] = 0xff;

        frame.reset();

        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.data().read()[0], 0);
    }

    #[test]
    fn test_copy_data_snapshots() {
        let frame = FrameHeader::new(FrameId::new(0));
        frame.data().write()[..4].copy_from_slice(&[1, 2, 3, 4]);

        let copy = frame.copy_data();
        frame.data().write()[0] = 9;

        assert_eq!(&copy[..4], &[1, 2, 3, 4]);
    }
}
