//! File-backed page storage.
//!
//! The disk manager maps page IDs to `PAGE_SIZE`-aligned slots in a
//! single database file. Slots are allocated lazily on first access and
//! recycled through a free list when pages are deleted; the file is
//! pre-sized and doubles in capacity when the slots run out. A sibling
//! `.log` file provides raw append-only log storage.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use strata_common::{PageId, DEFAULT_DISK_CAPACITY, PAGE_SIZE};

use super::error::{DiskError, DiskResult};

/// Block-oriented storage over a database file and a log file.
///
/// All operations are serialized by internal mutexes; callers observe
/// this only as completion ordering.
pub struct DiskManager {
    db: Mutex<DbFile>,
    log: Mutex<LogFile>,
}

struct DbFile {
    file: File,
    path: PathBuf,
    /// Page ID to byte offset of its slot.
    slots: HashMap<PageId, u64>,
    /// Slots released by deleted pages, available for reuse.
    free_slots: Vec<u64>,
    /// High-water mark of slots handed out, as a slot index.
    next_slot: u64,
    /// Number of slots the file is currently sized for.
    capacity: u64,
    num_writes: u64,
    num_deletes: u64,
}

struct LogFile {
    file: File,
    len: u64,
    num_flushes: u64,
}

impl DiskManager {
    /// Opens (creating if absent) the database file at `path` and its
    /// sibling log file, pre-sizing the database file for
    /// [`DEFAULT_DISK_CAPACITY`] pages.
    pub fn new(path: impl AsRef<Path>) -> DiskResult<Self> {
        let path = path.as_ref().to_path_buf();
        let log_path = path.with_extension("log");

        let file = Self::open_rw(&path)?;
        let capacity = DEFAULT_DISK_CAPACITY as u64;
        file.set_len((capacity + 1) * PAGE_SIZE as u64)?;

        let log_file = Self::open_rw(&log_path)?;
        let log_len = log_file.metadata()?.len();

        Ok(Self {
            db: Mutex::new(DbFile {
                file,
                path,
                slots: HashMap::new(),
                free_slots: Vec::new(),
                next_slot: 0,
                capacity,
                num_writes: 0,
                num_deletes: 0,
            }),
            log: Mutex::new(LogFile {
                file: log_file,
                len: log_len,
                num_flushes: 0,
            }),
        })
    }

    fn open_rw(path: &Path) -> DiskResult<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?)
    }

    /// Writes one page of data to the page's slot, allocating a slot on
    /// first write. The file grows as needed.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> DiskResult<()> {
        assert_eq!(data.len(), PAGE_SIZE, "page write of wrong length");

        let mut db = self.db.lock();
        let offset = match db.slots.get(&page_id) {
            Some(&offset) => offset,
            None => db.allocate_slot()?,
        };

        db.file.write_all_at(data, offset)?;
        db.slots.insert(page_id, offset);
        db.num_writes += 1;
        Ok(())
    }

    /// Fills the caller's buffer from the page's slot.
    ///
    /// A page that has never been written reads as zeros: its slot is
    /// allocated on the spot and the file is zero-extended.
    pub fn read_page(&self, page_id: PageId, buf: &mut [u8]) -> DiskResult<()> {
        assert_eq!(buf.len(), PAGE_SIZE, "page read of wrong length");

        let mut db = self.db.lock();
        let offset = match db.slots.get(&page_id) {
            Some(&offset) => offset,
            None => {
                let offset = db.allocate_slot()?;
                db.slots.insert(page_id, offset);
                offset
            }
        };

        let file_len = db.file.metadata()?.len();
        if offset + PAGE_SIZE as u64 > file_len {
            return Err(DiskError::SlotOutOfBounds {
                page_id,
                offset,
                file_len,
            });
        }

        db.file.read_exact_at(buf, offset)?;
        Ok(())
    }

    /// Releases the page's backing slot for reuse.
    ///
    /// Deleting a page that was never written is a no-op.
    pub fn delete_page(&self, page_id: PageId) -> DiskResult<()> {
        let mut db = self.db.lock();
        if let Some(offset) = db.slots.remove(&page_id) {
            db.free_slots.push(offset);
            db.num_deletes += 1;
        }
        Ok(())
    }

    /// Appends raw bytes to the log file.
    pub fn write_log(&self, data: &[u8]) -> DiskResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let mut log = self.log.lock();
        let offset = log.len;
        log.file.write_all_at(data, offset)?;
        log.len += data.len() as u64;
        log.num_flushes += 1;
        Ok(())
    }

    /// Fills the caller's buffer from the log file at `offset`.
    ///
    /// A read that extends past the end of the log zero-fills the tail
    /// of the buffer; only an offset beyond the file itself is an error.
    pub fn read_log(&self, buf: &mut [u8], offset: u64) -> DiskResult<()> {
        let log = self.log.lock();
        let log_len = log.file.metadata()?.len();
        if offset > log_len {
            return Err(DiskError::LogOutOfBounds {
                offset,
                len: buf.len(),
                log_len,
            });
        }

        let available = usize::min(buf.len(), (log_len - offset) as usize);
        log.file.read_exact_at(&mut buf[..available], offset)?;
        buf[available..].fill(0);
        Ok(())
    }

    /// Current size of the database file in bytes.
    pub fn db_file_size(&self) -> DiskResult<u64> {
        Ok(self.db.lock().file.metadata()?.len())
    }

    /// Number of completed page writes.
    pub fn num_writes(&self) -> u64 {
        self.db.lock().num_writes
    }

    /// Number of completed page deletions.
    pub fn num_deletes(&self) -> u64 {
        self.db.lock().num_deletes
    }

    /// Number of completed log appends.
    pub fn num_flushes(&self) -> u64 {
        self.log.lock().num_flushes
    }
}

impl DbFile {
    /// Returns the offset of a free slot, growing the file when none
    /// remain.
    fn allocate_slot(&mut self) -> DiskResult<u64> {
        if let Some(offset) = self.free_slots.pop() {
            return Ok(offset);
        }

        if self.next_slot + 1 >= self.capacity {
            self.capacity *= 2;
            self.file.set_len((self.capacity + 1) * PAGE_SIZE as u64)?;
        }

        let offset = self.next_slot * PAGE_SIZE as u64;
        self.next_slot += 1;
        Ok(offset)
    }
}

impl std::fmt::Debug for DiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let db = self.db.lock();
        f.debug_struct("DiskManager")
            .field("path", &db.path)
            .field("pages", &db.slots.len())
            .field("capacity", &db.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_manager() -> (tempfile::TempDir, DiskManager) {
        let dir = tempdir().unwrap();
        let manager = DiskManager::new(dir.path().join("test.db")).unwrap();
        (dir, manager)
    }

    #[test]
    fn test_write_read_roundtrip() {
        let (_dir, manager) = create_manager();

        let mut data = vec![0u8; PAGE_SIZE];
        data[..5].copy_from_slice(b"hello");
        manager.write_page(PageId::new(0), &data).unwrap();

        let mut buf = vec![0u8; PAGE_SIZE];
        manager.read_page(PageId::new(0), &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_unwritten_page_reads_zeros() {
        let (_dir, manager) = create_manager();

        let mut buf = vec![1u8; PAGE_SIZE];
        manager.read_page(PageId::new(7), &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_overwrite_keeps_slot() {
        let (_dir, manager) = create_manager();

        let a = vec![0xaa; PAGE_SIZE];
        let b = vec![0xbb; PAGE_SIZE];
        manager.write_page(PageId::new(3), &a).unwrap();
        manager.write_page(PageId::new(3), &b).unwrap();

        let mut buf = vec![0u8; PAGE_SIZE];
        manager.read_page(PageId::new(3), &mut buf).unwrap();
        assert_eq!(buf, b);
        assert_eq!(manager.num_writes(), 2);
    }

    #[test]
    fn test_delete_recycles_slot() {
        let (_dir, manager) = create_manager();

        let data = vec![0x11; PAGE_SIZE];
        manager.write_page(PageId::new(0), &data).unwrap();
        manager.write_page(PageId::new(1), &data).unwrap();
        let size_before = manager.db_file_size().unwrap();

        manager.delete_page(PageId::new(0)).unwrap();
        assert_eq!(manager.num_deletes(), 1);

        // The freed slot is reused, so the file does not grow.
        manager.write_page(PageId::new(2), &data).unwrap();
        assert_eq!(manager.db_file_size().unwrap(), size_before);
    }

    #[test]
    fn test_file_grows_past_initial_capacity() {
        let (_dir, manager) = create_manager();

        let data = vec![0x22; PAGE_SIZE];
        let pages = (DEFAULT_DISK_CAPACITY * 3) as i32;
        for i in 0..pages {
            manager.write_page(PageId::new(i), &data).unwrap();
        }

        // Every page reads back intact after the growth.
        let mut buf = vec![0u8; PAGE_SIZE];
        for i in 0..pages {
            manager.read_page(PageId::new(i), &mut buf).unwrap();
            assert_eq!(buf, data);
        }
    }

    #[test]
    fn test_log_roundtrip() {
        let (_dir, manager) = create_manager();

        manager.write_log(b"first entry").unwrap();
        manager.write_log(b" second").unwrap();
        assert_eq!(manager.num_flushes(), 2);

        let mut buf = [0u8; 18];
        manager.read_log(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"first entry second");
    }

    #[test]
    fn test_log_short_read_zero_fills() {
        let (_dir, manager) = create_manager();

        manager.write_log(b"short").unwrap();
        let mut buf = [0xffu8; 16];
        manager.read_log(&mut buf, 0).unwrap();
        assert_eq!(&buf[..5], b"short");
        assert!(buf[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_log_read_past_file_fails() {
        let (_dir, manager) = create_manager();

        manager.write_log(b"short").unwrap();
        let mut buf = [0u8; 4];
        let err = manager.read_log(&mut buf, 100).unwrap_err();
        assert!(matches!(err, DiskError::LogOutOfBounds { .. }));
    }
}
