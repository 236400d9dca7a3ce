//! Table state, phases, and snapshots.

use std::time::Instant;

use crate::cache::WindowCache;
use crate::cache::WindowLayout;
use crate::config::TableConfig;
use crate::query::Filter;
use crate::query::SortBy;
use crate::table::row::Column;
use crate::table::row::RowId;

/// Operating strategy for the current dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The entire dataset is resident; the UI pages, sorts, and filters
    /// locally with no further network calls.
    FullClient,
    /// Only a window of rows is resident at a time; further windows are
    /// fetched on demand.
    HybridServer,
}

impl Mode {
    /// Short name for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullClient => "full-client",
            Self::HybridServer => "hybrid-server",
        }
    }
}

/// Lifecycle phase of a table instance.
///
/// `Uninitialized → Classifying → Active { mode }`; refresh passes through
/// `Active { refreshing: true }` and re-runs classification, so the mode can
/// change across a refresh but never during ordinary paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TablePhase {
    /// Created but never loaded.
    Uninitialized,
    /// First response pending; the mode is not yet known.
    Classifying,
    /// Classified and serving rows.
    Active {
        /// The selected operating strategy.
        mode: Mode,
        /// Whether a refresh is in progress.
        refreshing: bool,
    },
}

impl TablePhase {
    /// The active mode, if classification has completed.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Self::Active { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    /// Returns `true` once classification has completed.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Returns `true` while a refresh is re-running classification.
    pub fn is_refreshing(&self) -> bool {
        matches!(self, Self::Active { refreshing: true, .. })
    }
}

/// What the engine is currently doing on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// No request in flight.
    Idle,
    /// A blocking fetch is in flight; the UI should show a loading state.
    Loading,
    /// A background fetch (prefetch) is in flight.
    Fetching,
}

/// Row storage, shaped by the active mode.
#[derive(Debug)]
pub(crate) enum RowStore<T> {
    /// Nothing fetched yet.
    Empty,
    /// Full-client mode: the entire dataset.
    Full(Vec<T>),
    /// Hybrid mode: cached windows plus the last plain-page fetch.
    Windowed {
        cache: WindowCache<T>,
        page_buffer: Vec<T>,
        buffered_page: Option<u32>,
    },
}

/// Mutable state of one table instance.
///
/// Owned by the controller behind its state lock; the fetch path is the only
/// writer of row data, handlers mutate paging/sort/filter/selection.
#[derive(Debug)]
pub(crate) struct TableState<T> {
    pub(crate) phase: TablePhase,
    pub(crate) activity: Activity,
    pub(crate) total_records: u64,
    pub(crate) current_page: u32,
    pub(crate) per_page: u32,
    pub(crate) layout: WindowLayout,
    pub(crate) sorts: Vec<SortBy>,
    pub(crate) filters: Vec<Filter>,
    pub(crate) selected: Vec<RowId>,
    pub(crate) columns: Vec<Column>,
    pub(crate) error: Option<String>,
    pub(crate) rows: RowStore<T>,
    pub(crate) last_prefetch: Option<Instant>,
}

impl<T> TableState<T> {
    pub(crate) fn new(config: &TableConfig, columns: Vec<Column>) -> Self {
        Self {
            phase: TablePhase::Uninitialized,
            activity: Activity::Idle,
            total_records: 0,
            current_page: 1,
            per_page: config.page_size,
            layout: WindowLayout::new(config.page_size, config.window_size),
            sorts: Vec::new(),
            filters: Vec::new(),
            selected: Vec::new(),
            columns,
            error: None,
            rows: RowStore::Empty,
            last_prefetch: None,
        }
    }

    /// Replaces the row store with an empty windowed store if it is not
    /// already windowed, and returns the cache.
    pub(crate) fn window_cache_mut(&mut self, max_windows: usize) -> &mut WindowCache<T> {
        if !matches!(self.rows, RowStore::Windowed { .. }) {
            self.rows = RowStore::Windowed {
                cache: WindowCache::new(max_windows),
                page_buffer: Vec::new(),
                buffered_page: None,
            };
        }
        match &mut self.rows {
            RowStore::Windowed { cache, .. } => cache,
            _ => unreachable!(),
        }
    }

    /// Stores a plain-page fetch result.
    pub(crate) fn store_page_buffer(&mut self, page: u32, rows: Vec<T>, max_windows: usize) {
        self.window_cache_mut(max_windows);
        if let RowStore::Windowed {
            page_buffer,
            buffered_page,
            ..
        } = &mut self.rows
        {
            *page_buffer = rows;
            *buffered_page = Some(page);
        }
    }

    /// Drops all windowed row data. The full-client row set is kept; the UI
    /// filters and sorts it locally.
    pub(crate) fn invalidate_windows(&mut self) {
        if let RowStore::Windowed {
            cache,
            page_buffer,
            buffered_page,
        } = &mut self.rows
        {
            cache.clear();
            page_buffer.clear();
            *buffered_page = None;
        }
    }

    /// Returns `true` if the given page can be served without a fetch.
    pub(crate) fn page_resident(&self, page: u32) -> bool {
        match &self.rows {
            RowStore::Empty => false,
            RowStore::Full(_) => true,
            RowStore::Windowed {
                cache,
                buffered_page,
                ..
            } => cache.contains(self.layout.window_for_page(page)) || *buffered_page == Some(page),
        }
    }

    /// The rows for the current view: the full set in full-client mode, the
    /// current page's slice in hybrid mode.
    pub(crate) fn current_rows(&mut self) -> Vec<T>
    where
        T: Clone,
    {
        let layout = self.layout;
        let page = self.current_page;
        match &mut self.rows {
            RowStore::Empty => Vec::new(),
            RowStore::Full(rows) => rows.clone(),
            RowStore::Windowed {
                cache,
                page_buffer,
                buffered_page,
            } => {
                if let Some(rows) = cache.page_rows(&layout, page) {
                    rows.to_vec()
                } else if *buffered_page == Some(page) {
                    page_buffer.clone()
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub(crate) fn set_selection(&mut self, ids: Vec<RowId>) {
        self.selected.clear();
        for id in ids {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
    }

    pub(crate) fn select(&mut self, id: RowId) {
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
    }

    pub(crate) fn deselect(&mut self, id: &RowId) {
        self.selected.retain(|selected| selected != id);
    }

    pub(crate) fn set_column_visibility(&mut self, field: &str, visible: bool) -> bool {
        match self.columns.iter_mut().find(|c| c.field == field) {
            Some(column) => {
                column.visible = visible;
                true
            }
            None => false,
        }
    }

    pub(crate) fn visible_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.field.clone())
            .collect()
    }

    pub(crate) fn hidden_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.visible)
            .map(|c| c.field.clone())
            .collect()
    }

    pub(crate) fn snapshot(&mut self) -> TableSnapshot<T>
    where
        T: Clone,
    {
        TableSnapshot {
            rows: self.current_rows(),
            total_records: self.total_records,
            current_page: self.current_page,
            per_page: self.per_page,
            phase: self.phase,
            loading: self.activity == Activity::Loading,
            fetching: self.activity == Activity::Fetching,
            error: self.error.clone(),
            selected: self.selected.clone(),
        }
    }
}

/// A coherent point-in-time view of the table, for rendering.
#[derive(Debug, Clone)]
pub struct TableSnapshot<T> {
    /// Rows for the current view: the full dataset in full-client mode, the
    /// current page in hybrid mode.
    pub rows: Vec<T>,
    /// Total records matching the current filters.
    pub total_records: u64,
    /// Current 1-based page.
    pub current_page: u32,
    /// Rows per page.
    pub per_page: u32,
    /// Lifecycle phase.
    pub phase: TablePhase,
    /// `true` while a blocking fetch is in flight.
    pub loading: bool,
    /// `true` while a background fetch is in flight.
    pub fetching: bool,
    /// Current user-facing error message, if any.
    pub error: Option<String>,
    /// Selected row identifiers, in selection order.
    pub selected: Vec<RowId>,
}

impl<T> TableSnapshot<T> {
    /// The active mode, if classification has completed.
    pub fn mode(&self) -> Option<Mode> {
        self.phase.mode()
    }
}
