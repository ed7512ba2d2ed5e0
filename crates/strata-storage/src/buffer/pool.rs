//! The buffer pool manager.
//!
//! Bookkeeping (page table, its inverse, the free list, and the
//! replacer) lives behind a single pool mutex. Frame headers are shared
//! with outstanding guards and the disk scheduler, so a guard can
//! release its pin without a back-pointer to the manager.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use strata_common::{FrameId, PageBuf, PageId};
use tracing::{debug, trace};

use crate::disk::{DiskManager, DiskRequest, DiskResult, DiskScheduler, RequestPayload};

use super::config::BufferPoolConfig;
use super::error::{BufferError, BufferResult};
use super::eviction::ArcReplacer;
use super::frame::FrameHeader;
use super::latch::{ReadPageGuard, WritePageGuard};
use super::BufferPoolStats;

/// Bookkeeping guarded by the pool mutex.
///
/// The page table and its inverse always agree on every resident pair,
/// and a frame is on the free list exactly when it is absent from the
/// inverse table.
pub(crate) struct PoolState {
    pub(crate) page_table: HashMap<PageId, FrameId>,
    pub(crate) frame_table: HashMap<FrameId, PageId>,
    pub(crate) free_frames: VecDeque<FrameId>,
    pub(crate) replacer: ArcReplacer,
}

/// An in-memory cache of fixed-size disk pages with pin-based
/// concurrency control and ARC replacement.
///
/// Accessors hand out [`ReadPageGuard`]s and [`WritePageGuard`]s that
/// enforce reader/writer exclusion per page and keep the hosting frame
/// pinned for their lifetime.
pub struct BufferPoolManager {
    num_frames: usize,
    next_page_id: AtomicI32,
    frames: Vec<Arc<FrameHeader>>,
    state: Arc<Mutex<PoolState>>,
    scheduler: Arc<DiskScheduler>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    eviction_count: AtomicU64,
    flush_count: AtomicU64,
}

impl BufferPoolManager {
    /// Creates a pool over the given disk manager.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(config: BufferPoolConfig, disk_manager: DiskManager) -> Self {
        config.validate().expect("invalid buffer pool configuration");
        let num_frames = config.num_frames;

        let frames: Vec<Arc<FrameHeader>> = (0..num_frames)
            .map(|i| Arc::new(FrameHeader::new(FrameId::new(i as i32))))
            .collect();
        let free_frames: VecDeque<FrameId> =
            (0..num_frames).map(|i| FrameId::new(i as i32)).collect();

        Self {
            num_frames,
            next_page_id: AtomicI32::new(0),
            frames,
            state: Arc::new(Mutex::new(PoolState {
                page_table: HashMap::with_capacity(num_frames),
                frame_table: HashMap::with_capacity(num_frames),
                free_frames,
                replacer: ArcReplacer::new(num_frames),
            })),
            scheduler: Arc::new(DiskScheduler::new(Arc::new(disk_manager))),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            eviction_count: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        }
    }

    /// Returns the configured frame count.
    pub fn size(&self) -> usize {
        self.num_frames
    }

    /// Allocates a fresh page identifier.
    ///
    /// No frame is reserved; the first `read_page` or `write_page` on
    /// the identifier loads it (as zeros if it was never written).
    pub fn new_page(&self) -> PageId {
        PageId::new(self.next_page_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Acquires shared access to a page, or `None` if every frame is
    /// pinned.
    pub fn checked_read_page(&self, page_id: PageId) -> Option<ReadPageGuard> {
        match self.pin_page(page_id) {
            Ok(frame) => Some(ReadPageGuard::new(
                page_id,
                frame,
                Arc::clone(&self.state),
                Arc::clone(&self.scheduler),
            )),
            Err(BufferError::PoolExhausted) => None,
            Err(err) => panic!("failed to load page {page_id}: {err}"),
        }
    }

    /// Acquires exclusive access to a page, or `None` if every frame is
    /// pinned.
    pub fn checked_write_page(&self, page_id: PageId) -> Option<WritePageGuard> {
        match self.pin_page(page_id) {
            Ok(frame) => Some(WritePageGuard::new(
                page_id,
                frame,
                Arc::clone(&self.state),
                Arc::clone(&self.scheduler),
            )),
            Err(BufferError::PoolExhausted) => None,
            Err(err) => panic!("failed to load page {page_id}: {err}"),
        }
    }

    /// Acquires shared access to a page.
    ///
    /// # Panics
    ///
    /// Panics if no frame is available.
    pub fn read_page(&self, page_id: PageId) -> ReadPageGuard {
        self.checked_read_page(page_id)
            .unwrap_or_else(|| panic!("cannot read page {page_id}: every frame is pinned"))
    }

    /// Acquires exclusive access to a page.
    ///
    /// # Panics
    ///
    /// Panics if no frame is available.
    pub fn write_page(&self, page_id: PageId) -> WritePageGuard {
        self.checked_write_page(page_id)
            .unwrap_or_else(|| panic!("cannot write page {page_id}: every frame is pinned"))
    }

    /// Drops a page from the pool and releases its backing slot.
    ///
    /// Returns false if the page is currently pinned. Deleting a page
    /// that is not resident only releases the disk slot.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id.index()];
            if frame.is_pinned() {
                return false;
            }

            state.page_table.remove(&page_id);
            state.frame_table.remove(&frame_id);
            state.replacer.remove(frame_id);

            if frame.is_dirty() {
                frame.set_dirty(false);
                let done = self.submit_write(page_id, frame.copy_data());
                if let Err(err) = Self::complete(done) {
                    panic!("flush of deleted page {page_id} failed: {err}");
                }
            }

            frame.reset();
            state.free_frames.push_back(frame_id);
            trace!(page = %page_id, frame = %frame_id, "dropped resident page");
        }
        drop(state);

        if let Err(err) = self.scheduler.deallocate_page(page_id) {
            panic!("deallocating page {page_id} failed: {err}");
        }
        true
    }

    /// Writes a resident page back to disk if it is dirty.
    ///
    /// Returns false if the page is not resident. The frame stays pinned
    /// and unevictable for the duration of the I/O.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let frame = Arc::clone(&self.frames[frame_id.index()]);
        if !frame.is_dirty() {
            return true;
        }

        frame.pin();
        state.replacer.set_evictable(frame_id, false);
        drop(state);

        frame.set_dirty(false);
        let done = self.submit_write(page_id, frame.copy_data());
        let result = Self::complete(done);
        self.flush_count.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.lock();
        if frame.unpin() == 0 {
            state.replacer.set_evictable(frame_id, true);
        }
        drop(state);

        if let Err(err) = result {
            panic!("flush of page {page_id} failed: {err}");
        }
        true
    }

    /// Flushes every dirty resident page.
    ///
    /// The resident set is snapshotted under the pool mutex and the I/O
    /// happens outside it.
    pub fn flush_all_pages(&self) {
        let mut state = self.state.lock();
        let resident: Vec<(PageId, FrameId)> =
            state.page_table.iter().map(|(&p, &f)| (p, f)).collect();

        let mut dirty_pages = Vec::new();
        for (page_id, frame_id) in resident {
            let frame = &self.frames[frame_id.index()];
            if frame.is_dirty() {
                frame.pin();
                state.replacer.set_evictable(frame_id, false);
                dirty_pages.push((page_id, frame_id));
            }
        }
        drop(state);

        debug!(count = dirty_pages.len(), "flushing all dirty pages");
        for &(page_id, frame_id) in &dirty_pages {
            let frame = &self.frames[frame_id.index()];
            frame.set_dirty(false);
            let done = self.submit_write(page_id, frame.copy_data());
            if let Err(err) = Self::complete(done) {
                panic!("flush of page {page_id} failed: {err}");
            }
            self.flush_count.fetch_add(1, Ordering::Relaxed);
        }

        let mut state = self.state.lock();
        for &(_, frame_id) in &dirty_pages {
            if self.frames[frame_id.index()].unpin() == 0 {
                state.replacer.set_evictable(frame_id, true);
            }
        }
    }

    /// Returns the pin count of a resident page, or `None` if the page
    /// is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<usize> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(self.frames[frame_id.index()].pin_count() as usize)
    }

    /// Returns a snapshot of pool statistics.
    pub fn stats(&self) -> BufferPoolStats {
        let resident_pages = self.state.lock().page_table.len();
        let mut pinned_frames = 0;
        let mut dirty_frames = 0;
        for frame in &self.frames {
            if frame.is_pinned() {
                pinned_frames += 1;
            }
            if frame.is_dirty() {
                dirty_frames += 1;
            }
        }

        BufferPoolStats {
            hits: self.hit_count.load(Ordering::Relaxed),
            misses: self.miss_count.load(Ordering::Relaxed),
            evictions: self.eviction_count.load(Ordering::Relaxed),
            flushes: self.flush_count.load(Ordering::Relaxed),
            resident_pages,
            pinned_frames,
            dirty_frames,
        }
    }

    /// The fetch-or-load pipeline shared by read and write acquisition.
    ///
    /// On success the frame is pinned and marked unevictable; the caller
    /// takes the frame latch after this returns (and the pool mutex is
    /// released).
    fn pin_page(&self, page_id: PageId) -> BufferResult<Arc<FrameHeader>> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = Arc::clone(&self.frames[frame_id.index()]);
            frame.pin();
            state.replacer.record_access(frame_id, page_id);
            state.replacer.set_evictable(frame_id, false);
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(frame);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let frame_id = match state.free_frames.pop_front() {
            Some(frame_id) => frame_id,
            None => {
                let Some(victim) = state.replacer.evict() else {
                    return Err(BufferError::PoolExhausted);
                };
                let evicted_page = state
                    .frame_table
                    .remove(&victim)
                    .expect("evicted frame absent from the inverse page table");
                state.page_table.remove(&evicted_page);
                self.eviction_count.fetch_add(1, Ordering::Relaxed);
                trace!(page = %evicted_page, frame = %victim, "evicting page");

                let frame = &self.frames[victim.index()];
                if frame.is_dirty() {
                    // In-pipeline flush: the pool mutex stays held.
                    frame.set_dirty(false);
                    let done = self.submit_write(evicted_page, frame.copy_data());
                    Self::complete(done)?;
                }
                victim
            }
        };

        let frame = Arc::clone(&self.frames[frame_id.index()]);
        let done = self.submit_read(page_id, Arc::clone(frame.data()));
        Self::complete(done)?;

        frame.pin();
        state.page_table.insert(page_id, frame_id);
        state.frame_table.insert(frame_id, page_id);
        state.replacer.record_access(frame_id, page_id);
        state.replacer.set_evictable(frame_id, false);
        Ok(frame)
    }

    fn submit_write(&self, page_id: PageId, data: PageBuf) -> Receiver<DiskResult<()>> {
        let (completion, done) = mpsc::channel();
        self.scheduler.schedule([DiskRequest {
            page_id,
            payload: RequestPayload::Write(data),
            completion,
        }]);
        done
    }

    fn submit_read(&self, page_id: PageId, dest: Arc<RwLock<PageBuf>>) -> Receiver<DiskResult<()>> {
        let (completion, done) = mpsc::channel();
        self.scheduler.schedule([DiskRequest {
            page_id,
            payload: RequestPayload::Read(dest),
            completion,
        }]);
        done
    }

    fn complete(done: Receiver<DiskResult<()>>) -> BufferResult<()> {
        done.recv().expect("disk scheduler worker terminated")?;
        Ok(())
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("num_frames", &self.num_frames)
            .field("stats", &self.stats())
            .finish()
    }
}
