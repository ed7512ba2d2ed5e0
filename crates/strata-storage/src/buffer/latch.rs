//! Page guards: scoped read/write handles over a resident page.
//!
//! A guard owns two resources for its whole lifetime: one pin on the
//! frame and the frame's reader/writer latch in the matching mode.
//! Dropping the guard releases both; the pin decrement happens under the
//! pool mutex so that the frame becomes evictable exactly when the last
//! guard goes away. Rust move semantics make a moved-from guard inert
//! and run the release exactly once on every exit path.

use std::sync::mpsc;
use std::sync::Arc;

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, Mutex, RawRwLock};
use strata_common::{PageBuf, PageId};

use crate::disk::{DiskRequest, DiskScheduler, RequestPayload};

use super::frame::FrameHeader;
use super::pool::PoolState;

/// Shared read access to a resident page.
///
/// Multiple read guards can coexist on one page; none can coexist with a
/// write guard.
pub struct ReadPageGuard {
    page_id: PageId,
    frame: Arc<FrameHeader>,
    pool: Arc<Mutex<PoolState>>,
    scheduler: Arc<DiskScheduler>,
    data: ArcRwLockReadGuard<RawRwLock, PageBuf>,
}

impl ReadPageGuard {
    /// Takes the frame's shared latch. The caller has already pinned the
    /// frame and must have released the pool mutex.
    pub(crate) fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        pool: Arc<Mutex<PoolState>>,
        scheduler: Arc<DiskScheduler>,
    ) -> Self {
        let data = frame.data().read_arc();
        Self {
            page_id,
            frame,
            pool,
            scheduler,
            data,
        }
    }

    /// Returns the guarded page's ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the page contents.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Returns true if the page has unflushed modifications.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    /// Writes the page through the scheduler if it is dirty and clears
    /// the dirty flag. Blocks until the I/O completes.
    pub fn flush(&self) {
        let _pool = self.pool.lock();
        if self.frame.is_dirty() {
            flush_frame_data(&self.scheduler, self.page_id, PageBuf::clone(&self.data));
            self.frame.set_dirty(false);
        }
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        let mut pool = self.pool.lock();
        if self.frame.unpin() == 0 {
            pool.replacer.set_evictable(self.frame.frame_id(), true);
        }
    }
}

impl std::fmt::Debug for ReadPageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadPageGuard")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame.frame_id())
            .finish()
    }
}

/// Exclusive write access to a resident page.
///
/// Holds the frame's exclusive latch; any mutable access marks the page
/// dirty.
pub struct WritePageGuard {
    page_id: PageId,
    frame: Arc<FrameHeader>,
    pool: Arc<Mutex<PoolState>>,
    scheduler: Arc<DiskScheduler>,
    data: ArcRwLockWriteGuard<RawRwLock, PageBuf>,
}

impl WritePageGuard {
    /// Takes the frame's exclusive latch. The caller has already pinned
    /// the frame and must have released the pool mutex.
    pub(crate) fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        pool: Arc<Mutex<PoolState>>,
        scheduler: Arc<DiskScheduler>,
    ) -> Self {
        let data = frame.data().write_arc();
        Self {
            page_id,
            frame,
            pool,
            scheduler,
            data,
        }
    }

    /// Returns the guarded page's ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Returns the page contents.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..]
    }

    /// Returns the page contents mutably, marking the page dirty.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.frame.set_dirty(true);
        &mut self.data[..]
    }

    /// Returns true if the page has unflushed modifications.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.frame.is_dirty()
    }

    /// Writes the page through the scheduler if it is dirty and clears
    /// the dirty flag. Blocks until the I/O completes.
    pub fn flush(&self) {
        let _pool = self.pool.lock();
        if self.frame.is_dirty() {
            flush_frame_data(&self.scheduler, self.page_id, PageBuf::clone(&self.data));
            self.frame.set_dirty(false);
        }
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        let mut pool = self.pool.lock();
        if self.frame.unpin() == 0 {
            pool.replacer.set_evictable(self.frame.frame_id(), true);
        }
    }
}

impl std::fmt::Debug for WritePageGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritePageGuard")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame.frame_id())
            .field("dirty", &self.frame.is_dirty())
            .finish()
    }
}

/// Schedules a write of the snapshotted bytes and blocks on completion.
///
/// Disk failures are fatal at this layer.
fn flush_frame_data(scheduler: &DiskScheduler, page_id: PageId, data: PageBuf) {
    let (completion, done) = mpsc::channel();
    scheduler.schedule([DiskRequest {
        page_id,
        payload: RequestPayload::Write(data),
        completion,
    }]);
    done.recv()
        .expect("disk scheduler worker terminated")
        .unwrap_or_else(|err| panic!("flush of page {page_id} failed: {err}"));
}
