//! Window cache and window/page arithmetic.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use log::debug;

use super::EvictionPolicy;
use super::LeastRecentlyUsed;

/// Maps between UI pages and cache windows.
///
/// A window is a contiguous run of rows spanning `pages_per_window` UI pages.
/// Windows are 1-based, never overlap, and `window_for_page` partitions the
/// page space. The effective window row count is always a whole multiple of
/// the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    page_size: u32,
    pages_per_window: u32,
}

impl WindowLayout {
    /// Creates a layout from the UI page size and the configured window size
    /// in rows. A window always spans at least one page.
    pub fn new(page_size: u32, window_size: u32) -> Self {
        let page_size = page_size.max(1);
        let pages_per_window = (window_size / page_size).max(1);
        Self {
            page_size,
            pages_per_window,
        }
    }

    /// Rows per UI page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// UI pages spanned by one window.
    pub fn pages_per_window(&self) -> u32 {
        self.pages_per_window
    }

    /// Rows held by one full window.
    pub fn window_rows(&self) -> u32 {
        self.pages_per_window * self.page_size
    }

    /// The 1-based window index containing a 1-based page.
    pub fn window_for_page(&self, page: u32) -> u32 {
        (page.max(1) - 1) / self.pages_per_window + 1
    }

    /// The first 1-based page of a window.
    pub fn first_page(&self, window: u32) -> u32 {
        (window.max(1) - 1) * self.pages_per_window + 1
    }

    /// The 1-based position of a page within its window.
    pub fn position_in_window(&self, page: u32) -> u32 {
        (page.max(1) - 1) % self.pages_per_window + 1
    }

    /// The row offset of a page within its window.
    pub fn page_offset(&self, page: u32) -> usize {
        (((page.max(1) - 1) % self.pages_per_window) * self.page_size) as usize
    }

    /// How far through its window a page sits, in `(0, 1]`.
    pub fn progress(&self, page: u32) -> f64 {
        f64::from(self.position_in_window(page)) / f64::from(self.pages_per_window)
    }

    /// Total page count for a dataset size.
    pub fn page_count(&self, total: u64) -> u32 {
        total.div_ceil(u64::from(self.page_size)) as u32
    }

    /// Total window count for a dataset size.
    pub fn window_count(&self, total: u64) -> u32 {
        self.page_count(total).div_ceil(self.pages_per_window)
    }
}

/// Rows cached for one window, with the time they were fetched.
#[derive(Debug, Clone)]
pub struct WindowSlot<T> {
    /// The cached rows, in server order.
    pub rows: Vec<T>,
    /// When the rows were fetched.
    pub fetched_at: DateTime<Utc>,
}

impl<T> WindowSlot<T> {
    /// Creates a slot stamped with the current time.
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows,
            fetched_at: Utc::now(),
        }
    }
}

/// A bounded cache of row windows.
///
/// Each table controller owns one instance. Capacity is enforced on insert:
/// when the resident count exceeds `max_windows`, the eviction policy names
/// victims until the cache fits.
///
/// # Example
///
/// ```
/// use windrow::cache::WindowCache;
///
/// let mut cache: WindowCache<String> = WindowCache::new(2);
/// cache.insert(1, vec!["a".into(), "b".into()]);
/// assert!(cache.contains(1));
/// ```
#[derive(Debug)]
pub struct WindowCache<T> {
    slots: HashMap<u32, WindowSlot<T>>,
    policy: Box<dyn EvictionPolicy>,
    max_windows: usize,
}

impl<T> WindowCache<T> {
    /// Creates a cache bounded to `max_windows` resident windows, evicting
    /// least-recently-used.
    pub fn new(max_windows: usize) -> Self {
        Self::with_policy(max_windows, Box::new(LeastRecentlyUsed::new()))
    }

    /// Creates a cache with a custom eviction policy.
    pub fn with_policy(max_windows: usize, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            slots: HashMap::new(),
            policy,
            max_windows: max_windows.max(1),
        }
    }

    /// Returns the rows for a window, marking it as recently used.
    pub fn get(&mut self, window: u32) -> Option<&[T]> {
        if !self.slots.contains_key(&window) {
            return None;
        }
        self.policy.on_access(window);
        self.slots.get(&window).map(|slot| slot.rows.as_slice())
    }

    /// Returns `true` if a window is resident, without touching recency.
    pub fn contains(&self, window: u32) -> bool {
        self.slots.contains_key(&window)
    }

    /// Stores rows for a window, evicting per policy if over capacity.
    pub fn insert(&mut self, window: u32, rows: Vec<T>) {
        self.slots.insert(window, WindowSlot::new(rows));
        self.policy.on_insert(window);

        while self.slots.len() > self.max_windows {
            let Some(victim) = self.policy.victim() else {
                break;
            };
            self.slots.remove(&victim);
            self.policy.on_remove(victim);
            debug!("window cache evicted window {victim}");
        }
    }

    /// Returns the rows for one page, slicing the resident window at the
    /// page's offset. The slice is clipped to the window's actual length and
    /// never crosses a window boundary.
    pub fn page_rows(&mut self, layout: &WindowLayout, page: u32) -> Option<&[T]> {
        let window = layout.window_for_page(page);
        let offset = layout.page_offset(page);
        let page_size = layout.page_size() as usize;

        let rows = self.get(window)?;
        let end = (offset + page_size).min(rows.len());
        rows.get(offset..end)
    }

    /// When a window's rows were fetched, if resident.
    pub fn fetched_at(&self, window: u32) -> Option<DateTime<Utc>> {
        self.slots.get(&window).map(|slot| slot.fetched_at)
    }

    /// Removes every resident window.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.policy.clear();
    }

    /// Number of resident windows.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no windows are resident.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The resident window indexes, sorted.
    pub fn resident_windows(&self) -> Vec<u32> {
        let mut windows: Vec<u32> = self.slots.keys().copied().collect();
        windows.sort_unstable();
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> WindowLayout {
        // 20 rows per page, 200 rows per window: 10 pages per window.
        WindowLayout::new(20, 200)
    }

    #[test]
    fn test_layout_partitions_page_space() {
        let layout = layout();
        assert_eq!(layout.pages_per_window(), 10);
        assert_eq!(layout.window_rows(), 200);
        assert_eq!(layout.window_for_page(1), 1);
        assert_eq!(layout.window_for_page(10), 1);
        assert_eq!(layout.window_for_page(11), 2);
        assert_eq!(layout.window_for_page(20), 2);
        assert_eq!(layout.window_for_page(21), 3);
        assert_eq!(layout.first_page(2), 11);
    }

    #[test]
    fn test_layout_offsets_stay_inside_window() {
        let layout = layout();
        assert_eq!(layout.page_offset(1), 0);
        assert_eq!(layout.page_offset(10), 180);
        assert_eq!(layout.page_offset(11), 0);
        // The last page's slice ends exactly at the window boundary.
        assert_eq!(layout.page_offset(10) + layout.page_size() as usize, 200);
    }

    #[test]
    fn test_layout_progress() {
        let layout = layout();
        assert!((layout.progress(8) - 0.8).abs() < 1e-9);
        assert!((layout.progress(10) - 1.0).abs() < 1e-9);
        assert!((layout.progress(11) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_layout_counts() {
        let layout = layout();
        assert_eq!(layout.page_count(5000), 250);
        assert_eq!(layout.window_count(5000), 25);
        assert_eq!(layout.page_count(5001), 251);
        assert_eq!(layout.window_count(5001), 26);
        assert_eq!(layout.page_count(0), 0);
    }

    #[test]
    fn test_window_never_smaller_than_one_page() {
        let layout = WindowLayout::new(50, 20);
        assert_eq!(layout.pages_per_window(), 1);
        assert_eq!(layout.window_rows(), 50);
    }

    #[test]
    fn test_cache_bound_evicts_least_recently_used() {
        let mut cache: WindowCache<u32> = WindowCache::new(2);
        cache.insert(1, vec![1]);
        cache.insert(2, vec![2]);
        cache.get(1);
        cache.insert(3, vec![3]);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.resident_windows(), vec![1, 3]);
    }

    #[test]
    fn test_cache_bound_holds_over_many_inserts() {
        let mut cache: WindowCache<u32> = WindowCache::new(3);
        for window in 1..=8 {
            cache.insert(window, vec![window]);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.resident_windows(), vec![6, 7, 8]);
    }

    #[test]
    fn test_page_rows_slices_window() {
        let layout = layout();
        let mut cache: WindowCache<u32> = WindowCache::new(2);
        cache.insert(1, (0..200).collect());

        let page1 = cache.page_rows(&layout, 1).unwrap();
        assert_eq!(page1.len(), 20);
        assert_eq!(page1[0], 0);

        let page10 = cache.page_rows(&layout, 10).unwrap();
        assert_eq!(page10[0], 180);
        assert_eq!(page10[19], 199);

        // Page 11 lives in window 2, which is not resident.
        assert!(cache.page_rows(&layout, 11).is_none());
    }

    #[test]
    fn test_page_rows_clipped_on_short_window() {
        let layout = layout();
        let mut cache: WindowCache<u32> = WindowCache::new(2);
        // Last window of a 4510-row dataset: 110 rows instead of 200.
        cache.insert(23, (0..110).collect());

        let page = cache.page_rows(&layout, 226).unwrap();
        assert_eq!(page.len(), 10);
    }

    #[test]
    fn test_clear() {
        let mut cache: WindowCache<u32> = WindowCache::new(2);
        cache.insert(1, vec![1]);
        cache.insert(2, vec![2]);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(1));
    }
}
