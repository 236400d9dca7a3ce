//! Cache eviction policies.

use std::collections::VecDeque;

/// Decides which resident window to evict when the cache is over capacity.
///
/// The cache reports every insert, access, and removal; [`victim`] names the
/// window to drop next. Policies are plain data structures so eviction order
/// is testable without a cache in front of them.
///
/// [`victim`]: EvictionPolicy::victim
pub trait EvictionPolicy: Send + Sync + std::fmt::Debug {
    /// Records that a window was inserted or overwritten.
    fn on_insert(&mut self, window: u32);

    /// Records that a window was read.
    fn on_access(&mut self, window: u32);

    /// Records that a window was removed.
    fn on_remove(&mut self, window: u32);

    /// Returns the window that should be evicted next, if any.
    fn victim(&self) -> Option<u32>;

    /// Forgets all recorded windows.
    fn clear(&mut self);
}

/// Least-recently-used eviction.
///
/// Tracks recency as a queue: the front is the coldest window, the back the
/// most recently touched. Inserts and accesses both count as touches.
#[derive(Debug, Default)]
pub struct LeastRecentlyUsed {
    order: VecDeque<u32>,
}

impl LeastRecentlyUsed {
    /// Creates a new LRU policy with no recorded windows.
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self, window: u32) {
        self.order.retain(|&w| w != window);
        self.order.push_back(window);
    }
}

impl EvictionPolicy for LeastRecentlyUsed {
    fn on_insert(&mut self, window: u32) {
        self.touch(window);
    }

    fn on_access(&mut self, window: u32) {
        self.touch(window);
    }

    fn on_remove(&mut self, window: u32) {
        self.order.retain(|&w| w != window);
    }

    fn victim(&self) -> Option<u32> {
        self.order.front().copied()
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}
