//! Adaptive Replacement Cache (ARC) eviction policy.
//!
//! ARC balances recency against frequency with four lists:
//!
//! 1. `mru` (T1): resident frames seen once, most recent first
//! 2. `mfu` (T2): resident frames seen at least twice
//! 3. `mru_ghost` (B1): page IDs recently evicted from `mru`
//! 4. `mfu_ghost` (B2): page IDs recently evicted from `mfu`
//!
//! A dynamic target `mru_target` (the paper's `p`) decides which
//! resident list eviction prefers. Ghost hits tune the target: a hit in
//! `mru_ghost` means recency deserved more room and raises it, a hit in
//! `mfu_ghost` lowers it.
//!
//! The lists are `LinkedHashMap`s, which pair a doubly linked list with
//! a hash index, so every operation is O(1) amortized; an eviction scan
//! only walks the unpinned prefix it has to skip.
//!
//! The replacer carries no lock of its own. The pool serializes all
//! calls under its mutex.

use std::collections::HashMap;

use hashlink::LinkedHashMap;
use strata_common::{FrameId, PageId};

/// Which resident list a frame lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResidentList {
    Mru,
    Mfu,
}

/// Which ghost list an evicted page's ID lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GhostList {
    Mru,
    Mfu,
}

#[derive(Debug, Clone, Copy)]
struct ResidentEntry {
    page_id: PageId,
    evictable: bool,
    list: ResidentList,
}

/// Self-tuning page replacement over a fixed set of frames.
///
/// Entries are keyed by frame ID while resident and by page ID while
/// ghosted. In every list the newest entry sits at the back; eviction
/// scans from the front (the oldest end).
pub struct ArcReplacer {
    capacity: usize,
    /// Target size for the MRU resident list (the ARC paper's `p`),
    /// always in `[0, capacity]`.
    mru_target: usize,
    /// Number of resident frames currently flagged evictable.
    curr_size: usize,
    mru: LinkedHashMap<FrameId, ()>,
    mfu: LinkedHashMap<FrameId, ()>,
    mru_ghost: LinkedHashMap<PageId, ()>,
    mfu_ghost: LinkedHashMap<PageId, ()>,
    resident: HashMap<FrameId, ResidentEntry>,
    ghost: HashMap<PageId, GhostList>,
}

impl ArcReplacer {
    /// Creates a replacer sized for `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            mru_target: 0,
            curr_size: 0,
            mru: LinkedHashMap::new(),
            mfu: LinkedHashMap::new(),
            mru_ghost: LinkedHashMap::new(),
            mfu_ghost: LinkedHashMap::new(),
            resident: HashMap::with_capacity(capacity),
            ghost: HashMap::new(),
        }
    }

    /// Records an access to the given frame and page pair.
    ///
    /// Resident frames are promoted towards the MFU list (the supplied
    /// `page_id` is ignored for them; the tracked identity is whatever
    /// was recorded at admission). A hit on a ghosted page re-admits it
    /// under the new frame, already evictable, and tunes the target. A
    /// cold miss admits the frame at the head of the MRU list, not
    /// evictable until the caller says so.
    pub fn record_access(&mut self, frame_id: FrameId, page_id: PageId) {
        if self.record_resident_hit(frame_id) {
            return;
        }
        if self.record_ghost_hit(frame_id, page_id) {
            return;
        }
        self.record_cold_miss(frame_id, page_id);
    }

    /// Flips whether the frame may be chosen for eviction.
    ///
    /// # Panics
    ///
    /// Panics if the frame is not tracked.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        let entry = self
            .resident
            .get_mut(&frame_id)
            .unwrap_or_else(|| panic!("frame {frame_id} is not tracked by the replacer"));

        if entry.evictable != evictable {
            if evictable {
                self.curr_size += 1;
            } else {
                self.curr_size -= 1;
            }
            entry.evictable = evictable;
        }
    }

    /// Removes and returns an evictable frame, ghosting its page, or
    /// `None` if every resident frame is pinned.
    pub fn evict(&mut self) -> Option<FrameId> {
        if self.mru.len() >= self.mru_target {
            self.evict_from(ResidentList::Mru)
                .or_else(|| self.evict_from(ResidentList::Mfu))
        } else {
            self.evict_from(ResidentList::Mfu)
                .or_else(|| self.evict_from(ResidentList::Mru))
        }
    }

    /// Forcibly drops a frame from tracking without recording a ghost.
    ///
    /// A no-op if the frame is untracked or not evictable, so pinned
    /// frames can never be yanked out from under their guards.
    pub fn remove(&mut self, frame_id: FrameId) {
        match self.resident.get(&frame_id) {
            Some(entry) if entry.evictable => {}
            _ => return,
        }

        let entry = self
            .resident
            .remove(&frame_id)
            .expect("entry present after lookup");
        match entry.list {
            ResidentList::Mru => self.mru.remove(&frame_id),
            ResidentList::Mfu => self.mfu.remove(&frame_id),
        }
        .expect("resident entry missing from its list");
        self.curr_size -= 1;
    }

    /// Number of resident frames currently evictable.
    pub fn size(&self) -> usize {
        self.curr_size
    }

    fn record_resident_hit(&mut self, frame_id: FrameId) -> bool {
        let Some(entry) = self.resident.get_mut(&frame_id) else {
            return false;
        };

        match entry.list {
            ResidentList::Mru => {
                self.mru
                    .remove(&frame_id)
                    .expect("resident entry missing from MRU list");
                self.mfu.insert(frame_id, ());
                entry.list = ResidentList::Mfu;
            }
            ResidentList::Mfu => {
                // Refresh the entry's position to most recent.
                self.mfu
                    .remove(&frame_id)
                    .expect("resident entry missing from MFU list");
                self.mfu.insert(frame_id, ());
            }
        }
        true
    }

    fn record_ghost_hit(&mut self, frame_id: FrameId, page_id: PageId) -> bool {
        let Some(&ghost_list) = self.ghost.get(&page_id) else {
            return false;
        };

        let b1 = self.mru_ghost.len();
        let b2 = self.mfu_ghost.len();
        match ghost_list {
            GhostList::Mru => {
                // Recency was undervalued: grow the MRU target by the
                // ghost ratio, at least 1, clamped to capacity.
                let delta = if b1 >= b2 { 1 } else { b2 / b1 };
                self.mru_target = usize::min(self.mru_target + delta, self.capacity);
                self.mru_ghost
                    .remove(&page_id)
                    .expect("ghost entry missing from MRU ghost list");
            }
            GhostList::Mfu => {
                // Frequency was undervalued: shrink the MRU target,
                // saturating at zero.
                let delta = if b2 >= b1 { 1 } else { b1 / b2 };
                self.mru_target = self.mru_target.saturating_sub(delta);
                self.mfu_ghost
                    .remove(&page_id)
                    .expect("ghost entry missing from MFU ghost list");
            }
        }
        self.ghost.remove(&page_id);

        self.mfu.insert(frame_id, ());
        self.resident.insert(
            frame_id,
            ResidentEntry {
                page_id,
                evictable: true,
                list: ResidentList::Mfu,
            },
        );
        self.curr_size += 1;
        true
    }

    fn record_cold_miss(&mut self, frame_id: FrameId, page_id: PageId) {
        let l1 = self.mru.len() + self.mru_ghost.len();
        let total = l1 + self.mfu.len() + self.mfu_ghost.len();

        if l1 == self.capacity {
            if self.mru.len() < self.capacity {
                let (dropped, ()) = self
                    .mru_ghost
                    .pop_front()
                    .expect("MRU ghost list empty with L1 at capacity");
                self.ghost.remove(&dropped);
            } else {
                // The MRU list alone fills the window: discard its
                // oldest entry without ghosting it.
                let (dropped, ()) = self.mru.pop_front().expect("MRU list empty at capacity");
                let entry = self
                    .resident
                    .remove(&dropped)
                    .expect("dropped frame missing a resident entry");
                if entry.evictable {
                    self.curr_size -= 1;
                }
            }
        } else if total == 2 * self.capacity {
            let (dropped, ()) = self
                .mfu_ghost
                .pop_front()
                .expect("MFU ghost list empty with history at capacity");
            self.ghost.remove(&dropped);
        }

        self.mru.insert(frame_id, ());
        self.resident.insert(
            frame_id,
            ResidentEntry {
                page_id,
                evictable: false,
                list: ResidentList::Mru,
            },
        );
    }

    /// Scans one resident list from its oldest end for an evictable
    /// frame and ghosts the victim's page.
    fn evict_from(&mut self, list: ResidentList) -> Option<FrameId> {
        let victim = {
            let resident = &self.resident;
            let candidates = match list {
                ResidentList::Mru => self.mru.iter(),
                ResidentList::Mfu => self.mfu.iter(),
            };
            candidates.map(|(&frame_id, _)| frame_id).find(|frame_id| {
                resident
                    .get(frame_id)
                    .unwrap_or_else(|| panic!("frame {frame_id} in list without resident entry"))
                    .evictable
            })?
        };

        let entry = self
            .resident
            .remove(&victim)
            .expect("victim entry present after scan");
        match list {
            ResidentList::Mru => {
                self.mru.remove(&victim);
                self.mru_ghost.insert(entry.page_id, ());
                self.ghost.insert(entry.page_id, GhostList::Mru);
            }
            ResidentList::Mfu => {
                self.mfu.remove(&victim);
                self.mfu_ghost.insert(entry.page_id, ());
                self.ghost.insert(entry.page_id, GhostList::Mfu);
            }
        }
        self.curr_size -= 1;
        Some(victim)
    }
}

impl std::fmt::Debug for ArcReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcReplacer")
            .field("capacity", &self.capacity)
            .field("mru_target", &self.mru_target)
            .field("evictable", &self.curr_size)
            .field("mru", &self.mru.len())
            .field("mfu", &self.mfu.len())
            .field("mru_ghost", &self.mru_ghost.len())
            .field("mfu_ghost", &self.mfu_ghost.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(id: i32) -> FrameId {
        FrameId::new(id)
    }

    fn pid(id: i32) -> PageId {
        PageId::new(id)
    }

    #[test]
    fn test_eviction_ordering() {
        let mut arc = ArcReplacer::new(5);

        arc.record_access(fid(1), pid(1));
        arc.record_access(fid(2), pid(2));
        arc.record_access(fid(3), pid(3));
        arc.record_access(fid(4), pid(4));
        arc.set_evictable(fid(1), true);
        arc.set_evictable(fid(2), true);
        arc.set_evictable(fid(3), true);
        arc.set_evictable(fid(4), false);

        assert_eq!(arc.size(), 3);

        // Promote frame 1 to the MFU list.
        arc.record_access(fid(1), pid(1));

        assert_eq!(arc.evict(), Some(fid(2)));
        assert_eq!(arc.evict(), Some(fid(3)));
        assert_eq!(arc.evict(), Some(fid(1)));
        assert_eq!(arc.evict(), None);
        assert_eq!(arc.size(), 0);

        arc.record_access(fid(2), pid(5));
        arc.set_evictable(fid(2), true);

        // Page 2 is ghosted, so this access re-admits it as frequent.
        arc.record_access(fid(3), pid(2));
        arc.set_evictable(fid(3), true);

        assert_eq!(arc.size(), 2);
    }

    #[test]
    fn test_ghost_history_tunes_target() {
        let mut arc = ArcReplacer::new(3);
        arc.record_access(fid(1), pid(1));
        arc.set_evictable(fid(1), true);
        arc.record_access(fid(2), pid(2));
        arc.set_evictable(fid(2), true);
        arc.record_access(fid(3), pid(3));
        arc.set_evictable(fid(3), true);
        assert_eq!(arc.size(), 3);

        assert_eq!(arc.evict(), Some(fid(1)));
        assert_eq!(arc.evict(), Some(fid(2)));
        assert_eq!(arc.evict(), Some(fid(3)));
        assert_eq!(arc.size(), 0);

        arc.record_access(fid(3), pid(4));
        arc.set_evictable(fid(3), true);

        arc.record_access(fid(2), pid(1));
        arc.set_evictable(fid(2), true);
        assert_eq!(arc.size(), 2);

        arc.record_access(fid(1), pid(3));
        arc.set_evictable(fid(1), true);

        assert_eq!(arc.evict(), Some(fid(3)));
        assert_eq!(arc.evict(), Some(fid(2)));
        assert_eq!(arc.evict(), Some(fid(1)));

        arc.record_access(fid(1), pid(1));
        arc.set_evictable(fid(1), true);

        arc.record_access(fid(2), pid(4));
        arc.set_evictable(fid(2), true);

        arc.record_access(fid(3), pid(5));
        arc.set_evictable(fid(3), true);
        assert_eq!(arc.evict(), Some(fid(1)));

        arc.record_access(fid(1), pid(6));
        arc.set_evictable(fid(1), true);
        assert_eq!(arc.evict(), Some(fid(2)));

        arc.record_access(fid(2), pid(7));
        arc.set_evictable(fid(2), true);
        assert_eq!(arc.evict(), Some(fid(3)));

        arc.record_access(fid(3), pid(5));
        arc.set_evictable(fid(3), true);

        assert_eq!(arc.evict(), Some(fid(3)));

        arc.record_access(fid(3), pid(2));
        arc.set_evictable(fid(3), true);

        assert_eq!(arc.evict(), Some(fid(1)));

        arc.record_access(fid(1), pid(3));
        arc.set_evictable(fid(1), true);

        assert_eq!(arc.evict(), Some(fid(2)));
        assert_eq!(arc.evict(), Some(fid(3)));
        assert_eq!(arc.evict(), Some(fid(1)));
    }

    #[test]
    fn test_size_counts_evictable_only() {
        let mut arc = ArcReplacer::new(4);
        for i in 0..4 {
            arc.record_access(fid(i), pid(i));
        }
        assert_eq!(arc.size(), 0);

        arc.set_evictable(fid(0), true);
        arc.set_evictable(fid(1), true);
        assert_eq!(arc.size(), 2);

        // Setting the same value twice does not double count.
        arc.set_evictable(fid(0), true);
        assert_eq!(arc.size(), 2);

        arc.set_evictable(fid(0), false);
        assert_eq!(arc.size(), 1);
    }

    #[test]
    fn test_remove_requires_evictable() {
        let mut arc = ArcReplacer::new(2);
        arc.record_access(fid(0), pid(0));

        // Not evictable yet: remove is a no-op.
        arc.remove(fid(0));
        arc.set_evictable(fid(0), true);
        assert_eq!(arc.size(), 1);

        arc.remove(fid(0));
        assert_eq!(arc.size(), 0);
        assert_eq!(arc.evict(), None);

        // Removed without ghosting: re-accessing the page is a cold miss
        // and lands in the MRU list, not evictable.
        arc.record_access(fid(1), pid(0));
        assert_eq!(arc.size(), 0);
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let mut arc = ArcReplacer::new(2);
        arc.remove(fid(7));
        assert_eq!(arc.size(), 0);
    }

    #[test]
    #[should_panic(expected = "not tracked by the replacer")]
    fn test_set_evictable_unknown_frame_panics() {
        let mut arc = ArcReplacer::new(2);
        arc.set_evictable(fid(0), true);
    }

    #[test]
    fn test_evict_skips_pinned_prefix() {
        let mut arc = ArcReplacer::new(3);
        for i in 0..3 {
            arc.record_access(fid(i), pid(i));
        }
        // Oldest two stay pinned; only the newest is evictable.
        arc.set_evictable(fid(2), true);

        assert_eq!(arc.evict(), Some(fid(2)));
        assert_eq!(arc.evict(), None);
    }

    #[test]
    fn test_ghost_capacity_is_bounded() {
        let capacity = 4;
        let mut arc = ArcReplacer::new(capacity);

        // Cycle many distinct pages through a pool-sized window so the
        // ghost lists see constant turnover.
        for i in 0..64 {
            let frame = fid(i % capacity as i32);
            if i >= capacity as i32 {
                assert!(arc.evict().is_some());
            }
            arc.record_access(frame, pid(i));
            arc.set_evictable(frame, true);
        }
        assert_eq!(arc.size(), capacity);
    }
}
