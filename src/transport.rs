//! HTTP transport layer.
//!
//! The engine talks to the remote endpoint through the [`Transport`] trait so
//! tests can swap in scripted implementations. [`HttpTransport`] is the
//! default, backed by a shared `reqwest` client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::ApiError;
use crate::error::Error;
use crate::query::QueryParams;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP method for an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

/// A request to the remote endpoint.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL, without query parameters.
    pub url: String,
    /// Query parameters, appended in order.
    pub params: QueryParams,
    /// JSON body for POST requests.
    pub body: Option<serde_json::Value>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiRequest {
    /// Creates a GET request with the default timeout.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: QueryParams::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a POST request carrying a JSON body.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params: QueryParams::new(),
            body: Some(body),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the query parameters.
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A response from the remote endpoint.
///
/// Any HTTP status is returned as `Ok`; callers classify success and failure.
/// `Err` is reserved for transport-level failures (connect, timeout).
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response from a status code and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::parse_with_body(e.to_string(), self.body.clone()))
    }
}

/// Sends requests to the remote endpoint.
///
/// `send` returns a response for every HTTP status; only transport-level
/// failures are errors. `download` streams a (successful) response body to a
/// local file and returns the number of bytes written.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and collects the response body.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;

    /// Sends a request and streams the response body to `dest`.
    async fn download(&self, request: ApiRequest, dest: &Path) -> Result<u64, Error>;
}

/// The default transport, backed by a shared `reqwest` client.
///
/// # Example
///
/// ```
/// use windrow::transport::HttpTransport;
///
/// let transport = HttpTransport::new();
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport from a custom `reqwest` client.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    fn build_request(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = request_url(request);
        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.timeout(request.timeout)
    }

    fn classify(error: reqwest::Error, timeout: Duration) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(timeout)
        } else {
            ApiError::Network(error)
        }
    }
}

/// Renders the full request URL, appending the encoded query string.
fn request_url(request: &ApiRequest) -> String {
    let mut url = request.url.clone();
    if !request.params.is_empty() {
        url.push('?');
        url.push_str(&request.params.to_query_string());
    }
    url
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let timeout = request.timeout;
        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        Ok(ApiResponse { status, body })
    }

    async fn download(&self, request: ApiRequest, dest: &Path) -> Result<u64, Error> {
        let timeout = request.timeout;
        let response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http(status, body).into());
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Self::classify(e, timeout))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}
