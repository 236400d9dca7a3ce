//! Behavior tests for the table engine against an in-memory transport.
//!
//! `MockTransport` serves a synthetic student dataset honoring the `page` and
//! `per_page` parameters, so classification, windowed paging, prefetch, and
//! invalidation run against realistic responses while every request stays
//! observable.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Semaphore;

use windrow::error::{ApiError, Error};
use windrow::query::{Filter, SortBy};
use windrow::transport::{ApiRequest, ApiResponse, Method, Transport};
use windrow::{
    Column, ExportOptions, Mode, PageEvent, RowId, TableConfig, TableController, TableRow,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Student {
    id: i64,
    name: String,
}

impl TableRow for Student {
    fn row_id(&self) -> RowId {
        RowId::Int(self.id)
    }
}

/// Serves rows 1..=total, honoring `page`/`per_page`, and records every
/// request. Clones share the same script and log.
#[derive(Clone)]
struct MockTransport {
    total: Arc<Mutex<u64>>,
    envelope: Arc<Mutex<Option<String>>>,
    bulk_response: Arc<Mutex<Option<(u16, String)>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    downloads: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    fn new(total: u64) -> Self {
        Self {
            total: Arc::new(Mutex::new(total)),
            envelope: Arc::new(Mutex::new(None)),
            bulk_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set_total(&self, total: u64) {
        *self.total.lock().unwrap() = total;
    }

    fn nest(&self, key: &str) {
        *self.envelope.lock().unwrap() = Some(key.to_string());
    }

    fn fail_bulk_with(&self, status: u16, body: &str) {
        *self.bulk_response.lock().unwrap() = Some((status, body.to_string()));
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn downloads(&self) -> Vec<ApiRequest> {
        self.downloads.lock().unwrap().clone()
    }
}

fn numeric_param(request: &ApiRequest, key: &str) -> Option<u64> {
    request.params.get(key)?.parse().ok()
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.url.ends_with("/bulk") {
            return Ok(match self.bulk_response.lock().unwrap().clone() {
                Some((status, body)) => ApiResponse::new(status, body),
                None => ApiResponse::new(200, "{}"),
            });
        }

        let total = *self.total.lock().unwrap();
        let page = numeric_param(&request, "page").unwrap_or(1);
        let per_page = numeric_param(&request, "per_page").unwrap_or(20);
        let start = (page - 1) * per_page;
        let end = start.saturating_add(per_page).min(total);
        let data: Vec<serde_json::Value> = (start..end)
            .map(|i| json!({ "id": i + 1, "name": format!("student-{}", i + 1) }))
            .collect();

        let payload = json!({ "data": data, "total": total });
        let body = match self.envelope.lock().unwrap().as_deref() {
            Some(key) => json!({ key: payload }).to_string(),
            None => payload.to_string(),
        };
        Ok(ApiResponse::new(200, body))
    }

    async fn download(&self, request: ApiRequest, dest: &Path) -> Result<u64, Error> {
        self.downloads.lock().unwrap().push(request.clone());
        tokio::fs::write(dest, b"id,name\n").await?;
        Ok(8)
    }
}

/// Blocks every send until the gate has a permit, so tests can hold a fetch
/// in flight.
#[derive(Clone)]
struct GatedTransport {
    inner: MockTransport,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.gate.acquire().await.expect("gate closed").forget();
        self.inner.send(request).await
    }

    async fn download(&self, request: ApiRequest, dest: &Path) -> Result<u64, Error> {
        self.inner.download(request, dest).await
    }
}

fn controller_with<X: Transport + 'static>(
    transport: X,
    config: TableConfig,
) -> TableController<Student> {
    TableController::builder()
        .endpoint("https://api.school.test/students")
        .transport(transport)
        .config(config)
        .columns([Column::new("id"), Column::new("name")])
        .build()
        .expect("controller should build")
}

fn controller(transport: MockTransport) -> TableController<Student> {
    controller_with(transport, TableConfig::default())
}

/// Waits until at least `requests` have been sent and no fetch is in flight.
async fn wait_for_settled(
    controller: &TableController<Student>,
    mock: &MockTransport,
    requests: usize,
) {
    for _ in 0..200 {
        let snapshot = controller.snapshot().await;
        if mock.request_count() >= requests && !snapshot.fetching && !snapshot.loading {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("background fetch did not settle");
}

// =============================================================================
// Mode classification
// =============================================================================

mod classification {
    use super::*;

    #[tokio::test]
    async fn test_small_dataset_runs_full_client() {
        let mock = MockTransport::new(500);
        let controller = controller(mock.clone());
        controller.load().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.mode(), Some(Mode::FullClient));
        assert_eq!(snapshot.total_records, 500);
        assert_eq!(snapshot.rows.len(), 500);
        assert!(snapshot.error.is_none());
        assert!(!snapshot.loading);

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].params.get("page"), Some("1"));
        assert_eq!(requests[0].params.get("per_page"), Some("20"));
        // the full load is oversized so it spots datasets that outgrew the probe
        assert_eq!(requests[1].params.get("per_page"), Some("1100"));
        assert_eq!(requests[1].params.get("full_load"), Some("true"));
    }

    #[tokio::test]
    async fn test_large_dataset_runs_hybrid() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.mode(), Some(Mode::HybridServer));
        assert_eq!(snapshot.total_records, 5000);
        assert_eq!(snapshot.rows.len(), 20);
        assert_eq!(snapshot.rows[0].id, 1);

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        // the follow-up fetches window 1, counted in window-sized pages
        assert_eq!(requests[1].params.get("page"), Some("1"));
        assert_eq!(requests[1].params.get("per_page"), Some("200"));
    }

    #[tokio::test]
    async fn test_nested_payloads_unwrap_via_data_property() {
        let mock = MockTransport::new(30);
        mock.nest("result");
        let config = TableConfig::default().data_property("result");
        let controller = controller_with(mock.clone(), config);
        controller.load().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.mode(), Some(Mode::FullClient));
        assert_eq!(snapshot.rows.len(), 30);
    }

    #[tokio::test]
    async fn test_refresh_reclassifies_when_the_dataset_shrinks() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;
        assert_eq!(controller.snapshot().await.mode(), Some(Mode::HybridServer));

        mock.set_total(300);
        controller.refresh().await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.mode(), Some(Mode::FullClient));
        assert_eq!(snapshot.rows.len(), 300);
        assert_eq!(snapshot.current_page, 1);
    }
}

// =============================================================================
// Paging and prefetch
// =============================================================================

mod paging {
    use super::*;

    #[tokio::test]
    async fn test_full_client_pages_and_filters_without_network() {
        let mock = MockTransport::new(300);
        let controller = controller(mock.clone());
        controller.load().await;
        let baseline = mock.request_count();

        controller.on_page(PageEvent::new(5)).await;
        controller.on_sort(vec![SortBy::asc("name")]).await;
        controller
            .apply_filters(vec![Filter::contains("name", "student")])
            .await;

        assert_eq!(mock.request_count(), baseline);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.rows.len(), 300);
        assert_eq!(snapshot.current_page, 1);
    }

    #[tokio::test]
    async fn test_pages_within_cached_window_need_no_fetch() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;
        let baseline = mock.request_count();

        for page in 2..=7 {
            controller.on_page(PageEvent::new(page)).await;
        }
        assert_eq!(mock.request_count(), baseline);

        let rows = controller.rows().await;
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[0].id, 121);
    }

    #[tokio::test]
    async fn test_prefetch_fires_near_window_edge() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;

        // 80% into window 1; the page itself is served from the cache
        controller.on_page(PageEvent::new(8)).await;
        assert_eq!(controller.rows().await[0].id, 141);

        wait_for_settled(&controller, &mock, 3).await;
        let requests = mock.requests();
        assert_eq!(requests[2].params.get("page"), Some("2"));
        assert_eq!(requests[2].params.get("per_page"), Some("200"));

        // entering window 2 later is a pure cache hit
        controller.on_page(PageEvent::new(11)).await;
        assert_eq!(controller.rows().await[0].id, 201);
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_prefetch_throttle_spaces_dispatches() {
        let mock = MockTransport::new(5000);
        let config = TableConfig::default().prefetch_throttle(Duration::from_secs(60));
        let controller = controller_with(mock.clone(), config);
        controller.load().await;

        controller.on_page(PageEvent::new(8)).await;
        wait_for_settled(&controller, &mock, 3).await;

        // 80% into window 2; window 3 is missing but the last dispatch is recent
        controller.on_page(PageEvent::new(18)).await;
        assert_eq!(controller.rows().await[0].id, 341);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_prefetch_resumes_after_the_throttle_interval() {
        let mock = MockTransport::new(5000);
        let config = TableConfig::default().prefetch_throttle(Duration::from_millis(50));
        let controller = controller_with(mock.clone(), config);
        controller.load().await;

        controller.on_page(PageEvent::new(8)).await;
        wait_for_settled(&controller, &mock, 3).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        controller.on_page(PageEvent::new(18)).await;
        wait_for_settled(&controller, &mock, 4).await;

        let requests = mock.requests();
        assert_eq!(requests[3].params.get("page"), Some("3"));
        assert_eq!(requests[3].params.get("per_page"), Some("200"));
    }

    #[tokio::test]
    async fn test_prefetch_stops_at_the_final_window() {
        let mock = MockTransport::new(1200);
        let controller = controller(mock.clone());
        controller.load().await;

        // page 58 is 80% into window 6 of 6; there is nothing left to fetch
        controller.on_page(PageEvent::new(58)).await;
        assert_eq!(controller.rows().await[0].id, 1141);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(mock.request_count(), 3);
        assert!(!controller.snapshot().await.fetching);
    }

    #[tokio::test]
    async fn test_per_page_change_rebuilds_the_window_layout() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;
        let baseline = mock.request_count();

        controller.on_page(PageEvent::new(1).with_per_page(50)).await;

        assert_eq!(controller.per_page().await, 50);
        // resident windows were sliced for the old page size and were dropped
        assert_eq!(mock.request_count(), baseline + 1);
        let last = mock.requests().into_iter().last().unwrap();
        assert_eq!(last.params.get("per_page"), Some("200"));
        assert_eq!(controller.rows().await.len(), 50);
    }

    #[tokio::test]
    async fn test_cache_keeps_at_most_the_configured_windows() {
        let mock = MockTransport::new(5000);
        let config = TableConfig::default().window_size(100).cache_max_windows(2);
        let controller = controller_with(mock.clone(), config);
        controller.load().await;
        controller.on_page(PageEvent::new(6)).await;
        controller.on_page(PageEvent::new(11)).await;
        assert_eq!(mock.request_count(), 4);

        // window 1 was evicted as least recently used, so page 2 refetches it
        controller.on_page(PageEvent::new(2)).await;
        assert_eq!(mock.request_count(), 5);
        assert_eq!(controller.rows().await[0].id, 21);
    }
}

// =============================================================================
// Invalidation
// =============================================================================

mod invalidation {
    use super::*;

    #[tokio::test]
    async fn test_sort_change_clears_cache_and_refetches() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;
        controller.on_page(PageEvent::new(3)).await;

        controller
            .on_sort(vec![SortBy::asc("name"), SortBy::desc("id")])
            .await;

        assert_eq!(controller.current_page().await, 1);
        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        let last = requests.last().unwrap();
        assert_eq!(last.params.get_all("sort[]"), vec!["name:asc", "id:desc"]);
        assert_eq!(last.params.get("page"), Some("1"));
        assert_eq!(last.params.get("per_page"), Some("200"));
    }

    #[tokio::test]
    async fn test_filter_events_are_debounced() {
        let mock = MockTransport::new(5000);
        let config = TableConfig::default().filter_debounce(Duration::from_millis(40));
        let controller = controller_with(mock.clone(), config);
        controller.load().await;
        let baseline = mock.request_count();

        controller.on_filter(vec![Filter::contains("name", "a")]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.on_filter(vec![Filter::contains("name", "an")]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.on_filter(vec![Filter::equals("status", "active")]);

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(mock.request_count(), baseline + 1);
        let last = mock.requests().into_iter().last().unwrap();
        assert_eq!(last.params.get("filters[status][$eq]"), Some("active"));
        assert!(!last.params.contains_key("filters[name][$contains]"));
        assert_eq!(controller.current_page().await, 1);
    }

    #[tokio::test]
    async fn test_empty_filter_values_never_reach_the_wire() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;

        controller
            .apply_filters(vec![
                Filter::equals("status", ""),
                Filter::equals("grade", serde_json::Value::Null),
                Filter::one_of("tags", Vec::<String>::new()),
            ])
            .await;

        let last = mock.requests().into_iter().last().unwrap();
        assert!(
            last.params
                .pairs()
                .iter()
                .all(|(key, _)| !key.starts_with("filters["))
        );
    }
}

// =============================================================================
// Concurrency discipline
// =============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn test_overlapping_fetch_is_skipped() {
        let mock = MockTransport::new(5000);
        let gate = Arc::new(Semaphore::new(2));
        let transport = GatedTransport {
            inner: mock.clone(),
            gate: gate.clone(),
        };
        let controller = controller_with(transport, TableConfig::default());
        controller.load().await;
        assert_eq!(mock.request_count(), 2);

        let background = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.on_page(PageEvent::new(12)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // the window-2 fetch is held at the gate; this one is a no-op
        controller.on_page(PageEvent::new(14)).await;
        assert_eq!(mock.request_count(), 2);
        assert_eq!(controller.current_page().await, 14);

        gate.add_permits(8);
        background.await.unwrap();

        assert_eq!(mock.request_count(), 3);
        assert_eq!(controller.rows().await[0].id, 261);
    }

    #[tokio::test]
    async fn test_response_arriving_after_sort_change_is_discarded() {
        let mock = MockTransport::new(5000);
        let gate = Arc::new(Semaphore::new(2));
        let transport = GatedTransport {
            inner: mock.clone(),
            gate: gate.clone(),
        };
        let controller = controller_with(transport, TableConfig::default());
        controller.load().await;

        let background = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.on_page(PageEvent::new(12)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        controller.on_sort(vec![SortBy::desc("name")]).await;
        gate.add_permits(8);
        background.await.unwrap();

        // the stale window never lands in the cache
        assert!(controller.rows().await.is_empty());
        assert_eq!(controller.current_page().await, 1);
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_close_cancels_pending_debounce() {
        let mock = MockTransport::new(5000);
        let config = TableConfig::default().filter_debounce(Duration::from_millis(30));
        let controller = controller_with(mock.clone(), config);
        controller.load().await;
        let baseline = mock.request_count();

        controller.on_filter(vec![Filter::equals("status", "active")]);
        controller.close();
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(mock.request_count(), baseline);
    }

    #[tokio::test]
    async fn test_close_clears_the_background_fetch_flag() {
        let mock = MockTransport::new(5000);
        let gate = Arc::new(Semaphore::new(2));
        let transport = GatedTransport {
            inner: mock.clone(),
            gate: gate.clone(),
        };
        let controller = controller_with(transport, TableConfig::default());
        controller.load().await;
        assert_eq!(mock.request_count(), 2);

        // nearing the window edge schedules a prefetch, which parks at the gate
        controller.on_page(PageEvent::new(8)).await;
        for _ in 0..200 {
            if controller.snapshot().await.fetching {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(controller.snapshot().await.fetching);

        controller.close();
        for _ in 0..200 {
            if !controller.snapshot().await.fetching {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(!controller.snapshot().await.fetching);
        // the parked request never reached the transport
        assert_eq!(mock.request_count(), 2);
    }
}

// =============================================================================
// Bulk actions, selection, and export
// =============================================================================

mod actions {
    use super::*;

    #[tokio::test]
    async fn test_bulk_action_posts_selection_and_refreshes() {
        let mock = MockTransport::new(100);
        let config = TableConfig::default().bulk_actions(["archive"]);
        let controller = controller_with(mock.clone(), config);
        controller.load().await;
        let baseline = mock.request_count();

        controller
            .set_selection(vec![RowId::Int(3), RowId::Int(7)])
            .await;
        controller.perform_bulk_action("archive").await.unwrap();

        let requests = mock.requests();
        let bulk = requests.iter().find(|r| r.url.ends_with("/bulk")).unwrap();
        assert_eq!(bulk.method, Method::Post);
        assert_eq!(
            bulk.body.as_ref().unwrap(),
            &json!({ "action": "archive", "ids": [3, 7] })
        );

        assert!(controller.selected_rows().await.is_empty());
        // a full refresh follows: probe plus full load
        assert_eq!(mock.request_count(), baseline + 3);
    }

    #[tokio::test]
    async fn test_bulk_action_rejects_bad_requests_locally() {
        let mock = MockTransport::new(100);
        let config = TableConfig::default().bulk_actions(["archive"]);
        let controller = controller_with(mock.clone(), config);
        controller.load().await;
        let baseline = mock.request_count();

        let err = controller.perform_bulk_action("purge").await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));

        let err = controller.perform_bulk_action("archive").await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));

        assert_eq!(mock.request_count(), baseline);
    }

    #[tokio::test]
    async fn test_bulk_validation_errors_surface_by_field() {
        let mock = MockTransport::new(100);
        mock.fail_bulk_with(
            422,
            r#"{"message":"Validation failed.","errors":{"status":["The status is invalid."]}}"#,
        );
        let config = TableConfig::default().bulk_actions(["archive"]);
        let controller = controller_with(mock.clone(), config);
        controller.load().await;
        let baseline = mock.request_count();
        controller.set_selection(vec![RowId::Int(1)]).await;

        let err = controller.perform_bulk_action("archive").await.unwrap_err();
        let errors = err.validation_errors().expect("validation payload");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["status"]);

        // selection kept, no refresh
        assert_eq!(controller.selected_rows().await, vec![RowId::Int(1)]);
        assert_eq!(mock.request_count(), baseline + 1);
        assert!(controller.error().await.is_some());
    }

    #[tokio::test]
    async fn test_selection_and_column_visibility() {
        let mock = MockTransport::new(10);
        let controller = controller(mock.clone());
        controller.load().await;

        controller.select_row(RowId::Int(1)).await;
        controller.select_row(RowId::Int(2)).await;
        controller.select_row(RowId::Int(1)).await;
        assert_eq!(
            controller.selected_rows().await,
            vec![RowId::Int(1), RowId::Int(2)]
        );
        controller.deselect_row(&RowId::Int(1)).await;
        assert_eq!(controller.selected_rows().await, vec![RowId::Int(2)]);
        controller.clear_selection().await;
        assert!(controller.selected_rows().await.is_empty());

        assert!(controller.set_column_visibility("name", false).await);
        assert_eq!(controller.hidden_columns().await, vec!["name"]);
        assert!(!controller.set_column_visibility("nope", false).await);
    }

    #[tokio::test]
    async fn test_export_full_client_writes_resident_rows() {
        let mock = MockTransport::new(25);
        let controller = controller(mock.clone());
        controller.load().await;

        let dest =
            std::env::temp_dir().join(format!("windrow-export-{}.json", uuid::Uuid::new_v4()));
        let report = controller
            .export(ExportOptions::default(), &dest)
            .await
            .unwrap();
        assert_eq!(report.rows, Some(25));

        let body = tokio::fs::read_to_string(&dest).await.unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(values.len(), 25);
        assert!(values[0].get("name").is_some());
        let _ = tokio::fs::remove_file(&dest).await;
    }

    #[tokio::test]
    async fn test_export_visible_only_drops_hidden_columns() {
        let mock = MockTransport::new(10);
        let controller = TableController::<Student>::builder()
            .endpoint("https://api.school.test/students")
            .transport(mock.clone())
            .columns([Column::new("name"), Column::new("id").hidden()])
            .build()
            .unwrap();
        controller.load().await;

        let dest =
            std::env::temp_dir().join(format!("windrow-export-{}.json", uuid::Uuid::new_v4()));
        controller
            .export(ExportOptions::default().visible_only(true), &dest)
            .await
            .unwrap();

        let body = tokio::fs::read_to_string(&dest).await.unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
        assert!(values[0].get("name").is_some());
        assert!(values[0].get("id").is_none());
        let _ = tokio::fs::remove_file(&dest).await;
    }

    #[tokio::test]
    async fn test_export_hybrid_delegates_to_the_export_endpoint() {
        let mock = MockTransport::new(5000);
        let controller = controller(mock.clone());
        controller.load().await;
        controller
            .apply_filters(vec![Filter::equals("status", "active")])
            .await;

        let dest =
            std::env::temp_dir().join(format!("windrow-export-{}.csv", uuid::Uuid::new_v4()));
        let report = controller
            .export(ExportOptions::default(), &dest)
            .await
            .unwrap();
        assert_eq!(report.rows, None);
        assert_eq!(report.bytes_written, 8);

        let downloads = mock.downloads();
        assert_eq!(downloads.len(), 1);
        assert!(downloads[0].url.ends_with("/export"));
        assert_eq!(
            downloads[0].params.get("filters[status][$eq]"),
            Some("active")
        );
        assert_eq!(downloads[0].params.get("export_all"), Some("true"));
        let _ = tokio::fs::remove_file(&dest).await;
    }
}
