//! Asynchronous disk request scheduling.
//!
//! The scheduler decouples pool threads from synchronous device I/O: a
//! single background worker drains a FIFO request queue and drives the
//! disk manager, fulfilling a completion handle per request. One worker
//! is enough — the disk manager serializes internally, so extra workers
//! would only contend on its mutex.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::RwLock;
use strata_common::sync::Channel;
use strata_common::{PageBuf, PageId};
use tracing::debug;

use super::error::DiskResult;
use super::manager::DiskManager;

/// Completion side of a disk request.
///
/// The worker sends exactly one value per request; callers hold the
/// matching receiver and block on it to await the I/O.
pub type Completion = Sender<DiskResult<()>>;

/// What a request carries to or from the disk.
pub enum RequestPayload {
    /// Destination buffer for a page read. The worker takes the write
    /// lock while filling it.
    Read(Arc<RwLock<PageBuf>>),
    /// Owned snapshot of the bytes to persist.
    Write(PageBuf),
}

/// A single disk I/O request.
pub struct DiskRequest {
    /// The page being read or written.
    pub page_id: PageId,
    /// Read destination or write payload.
    pub payload: RequestPayload,
    /// Handle fulfilled by the worker when the I/O completes.
    pub completion: Completion,
}

/// Serializes disk requests onto one background worker thread.
///
/// Requests are processed strictly in submission order. Dropping the
/// scheduler enqueues a shutdown sentinel behind any pending requests
/// and joins the worker.
pub struct DiskScheduler {
    disk_manager: Arc<DiskManager>,
    request_queue: Arc<Channel<Option<DiskRequest>>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Creates a scheduler over the given disk manager and starts its
    /// worker thread.
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let request_queue = Arc::new(Channel::new());

        let worker = {
            let disk_manager = Arc::clone(&disk_manager);
            let request_queue = Arc::clone(&request_queue);
            thread::Builder::new()
                .name("strata-disk-io".into())
                .spawn(move || Self::worker_loop(&disk_manager, &request_queue))
                .expect("failed to spawn disk scheduler worker")
        };

        Self {
            disk_manager,
            request_queue,
            worker: Some(worker),
        }
    }

    /// Enqueues a batch of requests in order.
    ///
    /// Returns immediately; callers await the requests' completion
    /// handles, in any order they like.
    pub fn schedule<I>(&self, requests: I)
    where
        I: IntoIterator<Item = DiskRequest>,
    {
        for request in requests {
            self.request_queue.put(Some(request));
        }
    }

    /// Releases a page's backing slot on disk.
    pub fn deallocate_page(&self, page_id: PageId) -> DiskResult<()> {
        self.disk_manager.delete_page(page_id)
    }

    fn worker_loop(disk_manager: &DiskManager, queue: &Channel<Option<DiskRequest>>) {
        debug!("disk scheduler worker started");
        while let Some(request) = queue.get() {
            let DiskRequest {
                page_id,
                payload,
                completion,
            } = request;

            let result = match payload {
                RequestPayload::Write(data) => disk_manager.write_page(page_id, &data[..]),
                RequestPayload::Read(dest) => {
                    let mut buf = dest.write();
                    disk_manager.read_page(page_id, &mut buf[..])
                }
            };

            // The requester may have given up waiting; a dead receiver
            // is not the worker's problem.
            let _ = completion.send(result);
        }
        debug!("disk scheduler worker stopped");
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        self.request_queue.put(None);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
