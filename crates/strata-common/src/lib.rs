//! # strata-common
//!
//! Common types and utilities for StrataDB.
//!
//! This crate provides the foundational pieces shared by the storage
//! components:
//!
//! - **Types**: core identifiers (`PageId`, `FrameId`) and the page
//!   buffer alias
//! - **Constants**: system-wide constants such as the page size
//! - **Sync**: small concurrency utilities (the blocking `Channel`)
//!
//! ## Example
//!
//! ```rust
//! use strata_common::types::{FrameId, PageId};
//! use strata_common::PAGE_SIZE;
//!
//! let page = PageId::new(42);
//! let frame = FrameId::new(0);
//! assert!(page.is_valid());
//! assert_eq!(PAGE_SIZE, 4096);
//! assert_eq!(frame.index(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod sync;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{FrameId, PageBuf, PageId};
