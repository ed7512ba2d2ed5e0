//! Small concurrency utilities.

mod channel;

pub use channel::Channel;
