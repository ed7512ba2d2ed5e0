//! Disk persistence layer.
//!
//! [`DiskManager`] owns the database file and its page-slot allocation;
//! [`DiskScheduler`] serializes read and write requests onto a single
//! background worker so that pool threads never touch the file directly.

mod error;
mod manager;
mod scheduler;

pub use error::{DiskError, DiskResult};
pub use manager::DiskManager;
pub use scheduler::{Completion, DiskRequest, DiskScheduler, RequestPayload};
