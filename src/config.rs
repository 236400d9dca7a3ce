//! Table engine configuration.

use std::time::Duration;

use crate::error::Error;

/// Configuration for a table controller.
///
/// Controls mode selection, window geometry, caching, retry behavior, and
/// the timing of debounced/throttled work.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use windrow::TableConfig;
///
/// // Default configuration
/// let config = TableConfig::default();
///
/// // Custom configuration
/// let custom = TableConfig::default()
///     .page_size(50)
///     .window_size(500)
///     .client_side_threshold(2000)
///     .max_retries(5)
///     .request_timeout(Duration::from_secs(30))
///     .bulk_actions(["archive", "delete"]);
/// ```
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Rows per UI page.
    pub page_size: u32,
    /// Rows per cached window. Rounded down to a whole number of pages.
    pub window_size: u32,
    /// Maximum resident windows in the cache.
    pub cache_max_windows: usize,
    /// Datasets at or below this total are loaded fully client-side.
    pub client_side_threshold: u64,
    /// Extra rows requested on top of the threshold during a full load, so
    /// one request can show whether the dataset outgrew the threshold.
    pub full_load_margin: u32,
    /// Total attempts for a retryable fetch.
    pub max_retries: u32,
    /// First retry delay; doubles per attempt.
    pub retry_base_delay: Duration,
    /// Upper bound on the retry delay.
    pub retry_max_delay: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Window fraction at which the next window is prefetched.
    pub prefetch_threshold: f64,
    /// Minimum spacing between triggered prefetches.
    pub prefetch_throttle: Duration,
    /// Quiet period before a filter change is applied.
    pub filter_debounce: Duration,
    /// Static query parameters appended to every data request.
    pub initial_params: Vec<(String, String)>,
    /// Bulk action identifiers the controller will accept.
    pub bulk_actions: Vec<String>,
    /// Dot path to unwrap enveloped response payloads.
    pub data_property: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            window_size: 200,
            cache_max_windows: 5,
            client_side_threshold: 1000,
            full_load_margin: 100,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(15),
            prefetch_threshold: 0.75,
            prefetch_throttle: Duration::from_millis(500),
            filter_debounce: Duration::from_millis(400),
            initial_params: Vec::new(),
            bulk_actions: Vec::new(),
            data_property: None,
        }
    }
}

impl TableConfig {
    /// Sets the rows per UI page.
    pub fn page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }

    /// Sets the rows per cached window.
    pub fn window_size(mut self, n: u32) -> Self {
        self.window_size = n;
        self
    }

    /// Sets the maximum resident windows.
    pub fn cache_max_windows(mut self, n: usize) -> Self {
        self.cache_max_windows = n;
        self
    }

    /// Sets the full-client threshold.
    pub fn client_side_threshold(mut self, n: u64) -> Self {
        self.client_side_threshold = n;
        self
    }

    /// Sets the full-load margin.
    pub fn full_load_margin(mut self, n: u32) -> Self {
        self.full_load_margin = n;
        self
    }

    /// Sets the total attempts for a retryable fetch.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the first retry delay.
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Sets the upper bound on the retry delay.
    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.retry_max_delay = delay;
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the prefetch trigger fraction, in `(0, 1]`.
    pub fn prefetch_threshold(mut self, fraction: f64) -> Self {
        self.prefetch_threshold = fraction;
        self
    }

    /// Sets the minimum spacing between triggered prefetches.
    pub fn prefetch_throttle(mut self, spacing: Duration) -> Self {
        self.prefetch_throttle = spacing;
        self
    }

    /// Sets the filter debounce quiet period.
    pub fn filter_debounce(mut self, quiet: Duration) -> Self {
        self.filter_debounce = quiet;
        self
    }

    /// Sets static query parameters appended to every data request.
    pub fn initial_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.initial_params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Sets the accepted bulk action identifiers.
    pub fn bulk_actions(mut self, actions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.bulk_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the dot path used to unwrap enveloped response payloads.
    pub fn data_property(mut self, path: impl Into<String>) -> Self {
        self.data_property = Some(path.into());
        self
    }

    /// The `per_page` value used for a full load.
    pub fn full_load_per_page(&self) -> u64 {
        self.client_side_threshold + u64::from(self.full_load_margin)
    }

    /// Checks the configuration for values the engine cannot operate with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.page_size == 0 {
            return Err(Error::invalid_config("page_size must be at least 1"));
        }
        if self.window_size < self.page_size {
            return Err(Error::invalid_config(
                "window_size must be at least one page",
            ));
        }
        if self.cache_max_windows == 0 {
            return Err(Error::invalid_config(
                "cache_max_windows must be at least 1",
            ));
        }
        if self.max_retries == 0 {
            return Err(Error::invalid_config("max_retries must be at least 1"));
        }
        if !(self.prefetch_threshold > 0.0 && self.prefetch_threshold <= 1.0) {
            return Err(Error::invalid_config(
                "prefetch_threshold must be in (0, 1]",
            ));
        }
        Ok(())
    }
}
