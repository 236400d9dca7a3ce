//! The public table controller and its builder.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;

use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cache::WindowLayout;
use crate::config::TableConfig;
use crate::error::ApiError;
use crate::error::Result;
use crate::query::Filter;
use crate::query::SortBy;
use crate::table::actions::ExportOptions;
use crate::table::actions::ExportReport;
use crate::table::fetch::FetchPlan;
use crate::table::row::Column;
use crate::table::row::RowId;
use crate::table::row::TableRow;
use crate::table::state::Mode;
use crate::table::state::TablePhase;
use crate::table::state::TableSnapshot;
use crate::table::state::TableState;
use crate::transport::HttpTransport;
use crate::transport::Transport;

/// A page-change event from the table UI.
///
/// Pages are 1-based. `per_page` is carried when the user also changed the
/// page size (UI table events usually bundle both).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEvent {
    /// The requested 1-based page.
    pub page: u32,
    /// New page size, if it changed.
    #[serde(default, alias = "rows")]
    pub per_page: Option<u32>,
}

impl PageEvent {
    /// Creates an event for navigating to `page`.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            per_page: None,
        }
    }

    /// Carries a page-size change along with the navigation.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

/// Drives a paginated table view against a remote endpoint.
///
/// The controller decides, from the first response, whether the dataset is
/// small enough to hold entirely in memory (the UI then pages, sorts, and
/// filters locally) or whether to keep only a window of rows resident and
/// fetch further windows on demand, prefetching ahead of the user's position.
///
/// This controller is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks safely.
///
/// # Example
///
/// ```ignore
/// use windrow::{Column, PageEvent, TableConfig, TableController};
///
/// let controller = TableController::<Student>::builder()
///     .endpoint("https://api.school.test/students")
///     .config(TableConfig::default().client_side_threshold(500))
///     .columns([Column::new("name"), Column::new("email")])
///     .build()?;
///
/// controller.load().await;
/// controller.on_page(PageEvent::new(2)).await;
/// let snapshot = controller.snapshot().await;
/// ```
#[derive(Clone)]
pub struct TableController<T: TableRow> {
    inner: Arc<ControllerInner<T>>,
}

pub(crate) struct ControllerInner<T: TableRow> {
    pub(crate) endpoint: String,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: TableConfig,
    pub(crate) state: Mutex<TableState<T>>,
    pub(crate) in_flight: AtomicBool,
    pub(crate) seq: AtomicU64,
    pub(crate) debounce: StdMutex<Option<JoinHandle<()>>>,
    pub(crate) cancel: CancellationToken,
}

impl<T: TableRow> TableController<T> {
    /// Creates a new builder for constructing a controller.
    pub fn builder() -> TableControllerBuilder<T, Missing> {
        TableControllerBuilder::new()
    }

    /// Performs the initial load: probes the dataset size and settles into
    /// full-client or hybrid-server operation.
    ///
    /// Fetch failures do not propagate; they surface through
    /// [`TableSnapshot::error`] after retries are exhausted.
    pub async fn load(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if !state.phase.is_active() {
                state.phase = TablePhase::Classifying;
            }
        }
        self.inner.classify_and_load().await;
    }

    /// Discards all fetched rows, resets to page 1, and reloads.
    ///
    /// Classification runs again, so the operating mode can change when the
    /// dataset moved across the client-side threshold.
    pub async fn refresh(&self) {
        self.inner.refresh_dataset().await;
    }

    /// Handles a page-change event.
    ///
    /// In full-client mode this only records the position. In hybrid mode the
    /// page's window is fetched if it is not resident, and a prefetch of the
    /// next window is scheduled when the position nears the window's edge.
    pub async fn on_page(&self, event: PageEvent) {
        let (plan, hybrid) = {
            let mut state = self.inner.state.lock().await;
            if let Some(per_page) = event.per_page {
                if per_page > 0 && per_page != state.per_page {
                    state.per_page = per_page;
                    state.layout = WindowLayout::new(per_page, self.inner.config.window_size);
                    state.invalidate_windows();
                    self.inner.invalidate_inflight();
                }
            }
            let mut page = event.page.max(1);
            if state.total_records > 0 {
                page = page.min(state.layout.page_count(state.total_records));
            }
            state.current_page = page;

            let hybrid = state.phase.mode() == Some(Mode::HybridServer);
            let plan = if hybrid && !state.page_resident(page) {
                Some(FetchPlan::Window(state.layout.window_for_page(page)))
            } else {
                None
            };
            (plan, hybrid)
        };

        if let Some(plan) = plan {
            self.inner.fetch(plan).await;
        }
        if hybrid {
            Arc::clone(&self.inner).maybe_prefetch().await;
        }
    }

    /// Handles a sort-change event.
    ///
    /// Cached windows are ordered by the previous sort, so the cache is
    /// cleared and the view resets to page 1. Hybrid mode re-fetches the
    /// first window; full-client mode records the sorts and lets the UI
    /// reorder locally.
    pub async fn on_sort(&self, sorts: Vec<SortBy>) {
        let refetch = {
            let mut state = self.inner.state.lock().await;
            self.inner.invalidate_inflight();
            state.sorts = sorts;
            state.current_page = 1;
            state.invalidate_windows();
            state.phase.mode() == Some(Mode::HybridServer)
        };
        if refetch {
            self.inner.fetch(FetchPlan::Window(1)).await;
        }
    }

    /// Handles a filter-change event, debounced.
    ///
    /// Each call restarts the quiet period; the filters are applied once no
    /// further call arrives for [`TableConfig::filter_debounce`]. Use
    /// [`apply_filters`](Self::apply_filters) to skip the debounce.
    pub fn on_filter(&self, filters: Vec<Filter>) {
        let inner = Arc::clone(&self.inner);
        let cancel = self.inner.cancel.clone();
        let quiet = self.inner.config.filter_debounce;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(quiet) => {
                    inner.apply_filter_change(filters).await;
                }
            }
        });
        if let Ok(mut pending) = self.inner.debounce.lock() {
            if let Some(previous) = pending.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Applies a filter change immediately, without debouncing.
    pub async fn apply_filters(&self, filters: Vec<Filter>) {
        self.inner.apply_filter_change(filters).await;
    }

    /// Submits the selected row identifiers to the bulk endpoint.
    ///
    /// The action must be one of [`TableConfig::bulk_actions`] and at least
    /// one row must be selected. On success the selection is cleared and the
    /// dataset refreshed. A 422 response returns
    /// [`Error::Validation`](crate::error::Error::Validation) with the
    /// field-level messages.
    pub async fn perform_bulk_action(&self, action: &str) -> Result<()> {
        self.inner.bulk_action(action).await
    }

    /// Exports the dataset to a local file.
    ///
    /// In full-client mode the resident rows are written directly; in hybrid
    /// mode a dedicated export request carrying the current filter and sort
    /// state is streamed to `dest`.
    pub async fn export(&self, options: ExportOptions, dest: impl AsRef<Path>) -> Result<ExportReport> {
        self.inner.export(options, dest.as_ref()).await
    }

    /// Cancels scheduled work (debounce, prefetch) and invalidates any fetch
    /// still in flight. The controller serves resident data afterwards but
    /// issues no further requests from background tasks.
    pub fn close(&self) {
        self.inner.invalidate_inflight();
        self.inner.cancel.cancel();
        if let Ok(mut pending) = self.inner.debounce.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// A coherent point-in-time view for rendering.
    pub async fn snapshot(&self) -> TableSnapshot<T> {
        self.inner.state.lock().await.snapshot()
    }

    /// The rows for the current view.
    pub async fn rows(&self) -> Vec<T> {
        self.inner.state.lock().await.current_rows()
    }

    /// Total records matching the current filters.
    pub async fn total_records(&self) -> u64 {
        self.inner.state.lock().await.total_records
    }

    /// The current 1-based page.
    pub async fn current_page(&self) -> u32 {
        self.inner.state.lock().await.current_page
    }

    /// The current page size.
    pub async fn per_page(&self) -> u32 {
        self.inner.state.lock().await.per_page
    }

    /// The current lifecycle phase.
    pub async fn phase(&self) -> TablePhase {
        self.inner.state.lock().await.phase
    }

    /// The current user-facing error message, if any.
    pub async fn error(&self) -> Option<String> {
        self.inner.state.lock().await.error.clone()
    }

    /// Clears the current error message.
    pub async fn dismiss_error(&self) {
        self.inner.state.lock().await.error = None;
    }

    /// The active sort list, primary sort first.
    pub async fn sorts(&self) -> Vec<SortBy> {
        self.inner.state.lock().await.sorts.clone()
    }

    /// The active filters.
    pub async fn filters(&self) -> Vec<Filter> {
        self.inner.state.lock().await.filters.clone()
    }

    /// The endpoint this controller reads from.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Replaces the selection, dropping duplicates but keeping order.
    pub async fn set_selection(&self, ids: Vec<RowId>) {
        self.inner.state.lock().await.set_selection(ids);
    }

    /// Adds a row to the selection.
    pub async fn select_row(&self, id: RowId) {
        self.inner.state.lock().await.select(id);
    }

    /// Removes a row from the selection.
    pub async fn deselect_row(&self, id: &RowId) {
        self.inner.state.lock().await.deselect(id);
    }

    /// Clears the selection.
    pub async fn clear_selection(&self) {
        self.inner.state.lock().await.selected.clear();
    }

    /// The selected row identifiers, in selection order.
    pub async fn selected_rows(&self) -> Vec<RowId> {
        self.inner.state.lock().await.selected.clone()
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Shows or hides a column. Returns `false` if the field is unknown.
    pub async fn set_column_visibility(&self, field: &str, visible: bool) -> bool {
        self.inner.state.lock().await.set_column_visibility(field, visible)
    }

    /// Fields of the currently visible columns.
    pub async fn visible_columns(&self) -> Vec<String> {
        self.inner.state.lock().await.visible_columns()
    }

    /// Fields of the currently hidden columns.
    pub async fn hidden_columns(&self) -> Vec<String> {
        self.inner.state.lock().await.hidden_columns()
    }
}

impl<T: TableRow> ControllerInner<T> {
    pub(crate) async fn apply_filter_change(&self, filters: Vec<Filter>) {
        let refetch = {
            let mut state = self.state.lock().await;
            self.invalidate_inflight();
            state.filters = filters;
            state.current_page = 1;
            state.invalidate_windows();
            state.phase.mode() == Some(Mode::HybridServer)
        };
        if refetch {
            self.fetch(FetchPlan::Window(1)).await;
        }
    }
}

impl<T: TableRow> Drop for ControllerInner<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Ok(mut pending) = self.debounce.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<V>(V);

/// Builder for constructing a [`TableController`].
///
/// Uses the typestate pattern to ensure the endpoint is set at compile time.
///
/// # Example
///
/// ```ignore
/// let controller = TableController::<Student>::builder()
///     .endpoint("https://api.school.test/students")
///     .columns([Column::new("name")])
///     .build()?;
/// ```
pub struct TableControllerBuilder<T, Endpoint> {
    endpoint: Endpoint,
    transport: Option<Arc<dyn Transport>>,
    config: TableConfig,
    columns: Vec<Column>,
    _row: PhantomData<T>,
}

impl<T: TableRow> TableControllerBuilder<T, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            endpoint: Missing,
            transport: None,
            config: TableConfig::default(),
            columns: Vec::new(),
            _row: PhantomData,
        }
    }

    /// Sets the remote data endpoint. Trailing slashes are trimmed.
    pub fn endpoint(self, endpoint: impl Into<String>) -> TableControllerBuilder<T, Set<String>> {
        TableControllerBuilder {
            endpoint: Set(endpoint.into()),
            transport: self.transport,
            config: self.config,
            columns: self.columns,
            _row: PhantomData,
        }
    }
}

impl<T: TableRow> Default for TableControllerBuilder<T, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TableRow, Endpoint> TableControllerBuilder<T, Endpoint> {
    /// Sets a custom transport.
    ///
    /// If not set, a reqwest-backed [`HttpTransport`] is used.
    pub fn transport<X: Transport + 'static>(mut self, transport: X) -> Self {
        self.transport = Some(Arc::new(transport) as Arc<dyn Transport>);
        self
    }

    /// Sets the table configuration.
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the column set backing visibility tracking and export projection.
    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Adds a single column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }
}

impl<T: TableRow> TableControllerBuilder<T, Set<String>> {
    /// Builds the [`TableController`].
    ///
    /// This method is only available once `endpoint` has been set. Fails if
    /// the configuration is invalid or the endpoint is not a valid URL.
    pub fn build(self) -> Result<TableController<T>> {
        self.config.validate()?;
        let endpoint = self.endpoint.0.trim_end_matches('/').to_string();
        Url::parse(&endpoint).map_err(|e| ApiError::InvalidUrl(format!("{endpoint}: {e}")))?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new()) as Arc<dyn Transport>);
        let state = TableState::new(&self.config, self.columns);

        Ok(TableController {
            inner: Arc::new(ControllerInner {
                endpoint,
                transport,
                config: self.config,
                state: Mutex::new(state),
                in_flight: AtomicBool::new(false),
                seq: AtomicU64::new(0),
                debounce: StdMutex::new(None),
                cancel: CancellationToken::new(),
            }),
        })
    }
}
