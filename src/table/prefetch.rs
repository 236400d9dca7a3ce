//! Background prefetch of the next window.

use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::table::controller::ControllerInner;
use crate::table::fetch::FetchPlan;
use crate::table::row::TableRow;
use crate::table::state::Activity;
use crate::table::state::Mode;
use crate::table::state::RowStore;

impl<T: TableRow> ControllerInner<T> {
    /// Schedules a background fetch of the next window when the current page
    /// nears the resident window's edge.
    ///
    /// Fires only in hybrid mode, when the position within the window reaches
    /// the configured threshold, the next window exists and is not already
    /// cached, and the previous prefetch is at least `prefetch_throttle` old.
    /// The fetch runs on a spawned task; the caller is never blocked.
    pub(crate) async fn maybe_prefetch(self: Arc<Self>) {
        let next = {
            let mut state = self.state.lock().await;
            if state.phase.mode() != Some(Mode::HybridServer) {
                return;
            }
            let layout = state.layout;
            let page = state.current_page;
            if layout.progress(page) < self.config.prefetch_threshold {
                return;
            }
            let next = layout.window_for_page(page) + 1;
            if next > layout.window_count(state.total_records) {
                return;
            }
            let cached = match &state.rows {
                RowStore::Windowed { cache, .. } => cache.contains(next),
                _ => false,
            };
            if cached {
                return;
            }
            if let Some(last) = state.last_prefetch {
                if last.elapsed() < self.config.prefetch_throttle {
                    debug!("prefetch of window {next} throttled");
                    return;
                }
            }
            state.last_prefetch = Some(Instant::now());
            next
        };
        self.spawn_prefetch(next);
    }

    fn spawn_prefetch(self: Arc<Self>, window: u32) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("prefetch of window {window} cancelled");
                    // The dropped fetch never reaches its own reset; only the
                    // flag it set itself is cleared here.
                    let mut state = self.state.lock().await;
                    if state.activity == Activity::Fetching {
                        state.activity = Activity::Idle;
                    }
                }
                outcome = self.fetch_as(FetchPlan::Window(window), Activity::Fetching) => {
                    debug!("prefetch of window {window}: {outcome:?}");
                }
            }
        });
    }
}
