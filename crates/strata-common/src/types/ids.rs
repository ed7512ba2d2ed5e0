//! Core identifier types for StrataDB.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page identifier - uniquely identifies a page in the database.
///
/// Page IDs are allocated monotonically by the buffer pool manager and
/// are never recycled during the pool's lifetime.
///
/// # Example
///
/// ```rust
/// use strata_common::types::PageId;
///
/// let page = PageId::new(42);
/// assert_eq!(page.as_i32(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageId(i32);

impl PageId {
    /// Invalid page ID constant, used as a sentinel value.
    pub const INVALID: Self = Self(-1);

    /// First page ID handed out by a fresh pool.
    pub const FIRST: Self = Self(0);

    /// Creates a new `PageId` from a raw i32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw i32 value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns the next page ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid page ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PageId(INVALID)")
        } else {
            write!(f, "PageId({})", self.0)
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PageId {
    #[inline]
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<PageId> for i32 {
    #[inline]
    fn from(id: PageId) -> Self {
        id.0
    }
}

/// Frame identifier - index into the buffer pool's frame array.
///
/// Frame IDs are fixed at pool construction and always lie in
/// `[0, num_frames)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FrameId(i32);

impl FrameId {
    /// Invalid frame ID.
    pub const INVALID: Self = Self(-1);

    /// Creates a new frame ID.
    #[inline]
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw i32 value.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns the frame's index into the pool's frame array.
    ///
    /// # Panics
    ///
    /// Panics if the frame ID is invalid.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        assert!(self.is_valid(), "indexed with invalid frame ID");
        self.0 as usize
    }

    /// Checks if this is a valid frame ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "FrameId(INVALID)")
        } else {
            write!(f, "FrameId({})", self.0)
        }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for FrameId {
    #[inline]
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<FrameId> for i32 {
    #[inline]
    fn from(id: FrameId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_basics() {
        let page = PageId::new(42);
        assert_eq!(page.as_i32(), 42);
        assert!(page.is_valid());
        assert_eq!(page.next(), PageId::new(43));
        assert!(!PageId::INVALID.is_valid());
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(7)), "7");
        assert_eq!(format!("{:?}", PageId::INVALID), "PageId(INVALID)");
    }

    #[test]
    fn test_frame_id_index() {
        assert_eq!(FrameId::new(3).index(), 3);
        assert!(!FrameId::INVALID.is_valid());
    }

    #[test]
    #[should_panic(expected = "invalid frame ID")]
    fn test_invalid_frame_index_panics() {
        let _ = FrameId::INVALID.index();
    }

    #[test]
    fn test_conversions() {
        let page: PageId = 5.into();
        assert_eq!(i32::from(page), 5);
        let frame: FrameId = 9.into();
        assert_eq!(i32::from(frame), 9);
    }
}
