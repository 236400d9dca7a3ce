//! Response payload parsing.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// One fetched range of rows plus the dataset total.
///
/// Every data response, whether a single page, a window, or a full load,
/// has this shape: `{ "data": [...], "total": n }`.
#[derive(Debug, Clone, Deserialize)]
pub struct PagePayload<T> {
    /// The rows for the requested range, in server order.
    ///
    /// The spelled-out default keeps `T: Default` out of the generated
    /// `Deserialize` bounds.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Total records matching the current filters.
    #[serde(default)]
    pub total: u64,
}

impl<T> PagePayload<T> {
    /// Creates a payload from rows and a total.
    pub fn new(data: Vec<T>, total: u64) -> Self {
        Self { data, total }
    }
}

/// Parses a response body into a [`PagePayload`].
///
/// Some APIs wrap the payload under a named property
/// (`{ "resource": { "data": [...], "total": n } }`); `data_property` is a
/// dot path to unwrap such envelopes before decoding.
pub fn parse_page<T: DeserializeOwned>(
    body: &str,
    data_property: Option<&str>,
) -> Result<PagePayload<T>, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::parse_with_body(format!("invalid JSON: {e}"), body))?;
    let value = unwrap_envelope(value, data_property)?;
    serde_json::from_value(value).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
}

fn unwrap_envelope(value: Value, path: Option<&str>) -> Result<Value, ApiError> {
    let Some(path) = path else {
        return Ok(value);
    };

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(mut map) => map.remove(segment).ok_or_else(|| {
                ApiError::parse(format!("response is missing property '{segment}' (path '{path}')"))
            })?,
            _ => {
                return Err(ApiError::parse(format!(
                    "response property '{segment}' is not an object (path '{path}')"
                )));
            }
        };
    }
    Ok(current)
}
