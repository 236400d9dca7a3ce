//! Fetch execution: request planning, retry with backoff, single-flight
//! discipline, and mode classification.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use log::debug;
use log::info;
use log::warn;

use crate::error::ApiError;
use crate::error::Error;
use crate::query;
use crate::query::QueryParams;
use crate::response;
use crate::response::PagePayload;
use crate::table::controller::ControllerInner;
use crate::table::row::TableRow;
use crate::table::state::Activity;
use crate::table::state::Mode;
use crate::table::state::RowStore;
use crate::table::state::TablePhase;
use crate::table::state::TableState;
use crate::transport::ApiRequest;

/// What a fetch requests and where the result lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchPlan {
    /// One UI page, kept in the page buffer.
    Page(u32),
    /// One window, kept in the window cache.
    Window(u32),
    /// The entire dataset in a single oversized request.
    FullLoad,
}

/// How a fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    /// The response was applied to state.
    Completed,
    /// The response was discarded; the view changed while it was in flight.
    Stale,
    /// Another fetch was already in flight.
    Skipped,
    /// Every attempt failed; the error was surfaced.
    Failed,
}

/// Releases the single-flight guard on every exit path.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Transient notice shown while a retryable failure is being retried.
fn retry_notice(attempt: u32, max_attempts: u32) -> String {
    format!("Retrying... ({attempt}/{max_attempts})")
}

/// Recognizes a [`retry_notice`] message, whatever its attempt counts.
fn is_retry_notice(message: &str) -> bool {
    message.starts_with("Retrying... (")
}

impl<T: TableRow> ControllerInner<T> {
    /// Bumps the sequence so responses still in flight are discarded on
    /// arrival. When the bump accompanies a state change, call this while
    /// holding the state lock so requests built under the lock read a token
    /// consistent with the state they snapshot.
    pub(crate) fn invalidate_inflight(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
    }

    fn current_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Runs a blocking fetch.
    pub(crate) async fn fetch(&self, plan: FetchPlan) -> FetchOutcome {
        self.fetch_as(plan, Activity::Loading).await
    }

    /// Runs a fetch with the given activity marker.
    ///
    /// At most one fetch is in flight per controller; an overlapping call is
    /// a logged no-op and callers re-trigger once the flight completes if the
    /// data is still missing. Failures are absorbed into state.
    pub(crate) async fn fetch_as(&self, plan: FetchPlan, activity: Activity) -> FetchOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("fetch of {plan:?} skipped, another request is in flight");
            return FetchOutcome::Skipped;
        }
        let _guard = FlightGuard(&self.in_flight);

        let (token, request) = {
            let mut state = self.state.lock().await;
            state.activity = activity;
            if activity == Activity::Loading {
                state.error = None;
            }
            (self.current_seq(), self.request_for(&state, plan))
        };

        let outcome = match self.send_with_retry(request).await {
            Ok(payload) => self.apply(plan, payload, token).await,
            Err(error) => {
                self.record_failure(&error).await;
                FetchOutcome::Failed
            }
        };

        self.state.lock().await.activity = Activity::Idle;
        outcome
    }

    fn request_for(&self, state: &TableState<T>, plan: FetchPlan) -> ApiRequest {
        let mut params = query::translate(&state.filters, &state.sorts);
        for (key, value) in &self.config.initial_params {
            params.push(key.clone(), value.clone());
        }
        self.push_paging(&mut params, state, plan);

        ApiRequest::get(&self.endpoint)
            .with_params(params)
            .with_timeout(self.config.request_timeout)
    }

    fn push_paging(&self, params: &mut QueryParams, state: &TableState<T>, plan: FetchPlan) {
        match plan {
            FetchPlan::Page(page) => {
                params.push("page", page.to_string());
                params.push("per_page", state.per_page.to_string());
            }
            FetchPlan::Window(window) => {
                // Windowed requests count the page parameter in window-sized
                // units: window w holds rows (w-1)*windowRows .. w*windowRows.
                params.push("page", window.to_string());
                params.push("per_page", state.layout.window_rows().to_string());
            }
            FetchPlan::FullLoad => {
                params.push("page", "1");
                params.push("per_page", self.config.full_load_per_page().to_string());
                params.push("full_load", "true");
            }
        }
    }

    async fn send_with_retry(&self, request: ApiRequest) -> Result<PagePayload<T>, Error> {
        let max_attempts = self.config.max_retries.max(1);
        let mut delay = self.config.retry_base_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.send_once(request.clone()).await {
                Ok(payload) => return Ok(payload),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        "request to {} failed (attempt {attempt}/{max_attempts}): {e}",
                        request.url
                    );
                    self.set_transient_error(retry_notice(attempt, max_attempts))
                        .await;
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.config.retry_max_delay);
                }
                Err(e) => return Err(Error::Api(e)),
            }
        }
    }

    async fn send_once(&self, request: ApiRequest) -> Result<PagePayload<T>, ApiError> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ApiError::http(response.status, response.body));
        }
        response::parse_page(&response.body, self.config.data_property.as_deref())
    }

    /// Writes a successful payload into state, unless the view changed while
    /// the request was in flight.
    async fn apply(&self, plan: FetchPlan, payload: PagePayload<T>, token: u64) -> FetchOutcome {
        let mut state = self.state.lock().await;
        if token != self.current_seq() {
            debug!("discarding stale response for {plan:?}");
            // A retry notice belongs to this fetch; it must not outlive it.
            if state.error.as_deref().is_some_and(is_retry_notice) {
                state.error = None;
            }
            return FetchOutcome::Stale;
        }
        state.total_records = payload.total;
        state.error = None;
        match plan {
            FetchPlan::Page(page) => {
                state.store_page_buffer(page, payload.data, self.config.cache_max_windows);
            }
            FetchPlan::Window(window) => {
                state
                    .window_cache_mut(self.config.cache_max_windows)
                    .insert(window, payload.data);
            }
            FetchPlan::FullLoad => {
                state.rows = RowStore::Full(payload.data);
            }
        }
        FetchOutcome::Completed
    }

    async fn record_failure(&self, error: &Error) {
        warn!("fetch failed: {error}");
        let message = match error {
            Error::Api(api) => api.user_message(),
            other => other.to_string(),
        };
        self.state.lock().await.error = Some(message);
    }

    async fn set_transient_error(&self, message: String) {
        self.state.lock().await.error = Some(message);
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Probes the dataset size, selects the operating mode, and loads the
    /// initial rows. Runs on the initial load and on every refresh.
    pub(crate) async fn classify_and_load(&self) {
        match self.fetch(FetchPlan::Page(1)).await {
            FetchOutcome::Completed => {}
            FetchOutcome::Failed => {
                // Leave the table usable: the previous mode keeps serving
                // resident rows, a never-loaded table returns to square one.
                let mut state = self.state.lock().await;
                state.phase = match state.phase {
                    TablePhase::Active { mode, .. } => TablePhase::Active {
                        mode,
                        refreshing: false,
                    },
                    _ => TablePhase::Uninitialized,
                };
                return;
            }
            outcome => {
                debug!("classification probe not applied: {outcome:?}");
                return;
            }
        }

        let (total, mode) = {
            let state = self.state.lock().await;
            let total = state.total_records;
            let mode = if total <= self.config.client_side_threshold {
                Mode::FullClient
            } else {
                Mode::HybridServer
            };
            (total, mode)
        };
        info!("dataset of {total} rows runs {}", mode.as_str());

        let follow_up = match mode {
            Mode::FullClient => FetchPlan::FullLoad,
            Mode::HybridServer => FetchPlan::Window(1),
        };
        match self.fetch(follow_up).await {
            FetchOutcome::Completed => {
                let mut state = self.state.lock().await;
                state.phase = TablePhase::Active {
                    mode,
                    refreshing: false,
                };
            }
            FetchOutcome::Failed => {
                // The page-1 probe buffer is still resident; settle in hybrid
                // mode rather than claim a complete dataset.
                let mut state = self.state.lock().await;
                state.phase = TablePhase::Active {
                    mode: Mode::HybridServer,
                    refreshing: false,
                };
            }
            outcome => {
                debug!("classification follow-up not applied: {outcome:?}");
            }
        }
    }

    /// Full refresh: drops windowed rows, resets to page 1, re-classifies.
    pub(crate) async fn refresh_dataset(&self) {
        {
            let mut state = self.state.lock().await;
            self.invalidate_inflight();
            state.phase = match state.phase {
                TablePhase::Active { mode, .. } => TablePhase::Active {
                    mode,
                    refreshing: true,
                },
                _ => TablePhase::Classifying,
            };
            state.current_page = 1;
            state.invalidate_windows();
            state.error = None;
        }
        self.classify_and_load().await;
    }
}
