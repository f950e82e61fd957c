//! Accept loop and session bookkeeping.

pub mod listener;
pub mod pool;

pub use pool::{SessionPool, Slot};
