//! Buffer pool configuration.

use strata_common::{DEFAULT_POOL_FRAMES, PAGE_SIZE};

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of page frames in the buffer pool, fixed for the life of
    /// the pool.
    pub num_frames: usize,
}

impl BufferPoolConfig {
    /// Creates a configuration with the specified number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self { num_frames }
    }

    /// Creates a configuration from a memory budget in bytes.
    pub fn from_memory_size(memory_bytes: usize) -> Self {
        Self::new((memory_bytes / PAGE_SIZE).max(1))
    }

    /// Returns the total memory used by the pool's frames.
    pub fn memory_usage(&self) -> usize {
        self.num_frames * PAGE_SIZE
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_frames == 0 {
            return Err("num_frames must be > 0");
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_FRAMES)
    }
}
