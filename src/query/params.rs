//! Query parameter assembly and encoding.

use serde_json::Value;

use super::Filter;
use super::SortBy;

/// An ordered list of query parameters.
///
/// Insertion order is preserved so multi-valued keys (`sort[]`,
/// `filters[field][$in][]`) keep their list order on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Appends all parameters from an iterator of pairs.
    pub fn extend<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.push(key, value);
        }
    }

    /// Returns the parameters as ordered key/value pairs.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Returns the first value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value recorded for a key, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns `true` if a parameter with this key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no parameters are present.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renders the parameters as a percent-encoded query string.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

/// Translates UI filters and sorts into backend query parameters.
///
/// Non-empty filters emit `filters[field][token]=value` (one pair per element
/// for multi-valued operators); the reserved global filter emits `search=`;
/// sorts emit ordered `sort[]=field:direction` pairs. Filters with empty
/// values are omitted entirely. Pure function of its inputs.
pub fn translate(filters: &[Filter], sorts: &[SortBy]) -> QueryParams {
    let mut params = QueryParams::new();

    for filter in filters.iter().filter(|f| f.has_value()) {
        if filter.is_global() {
            params.push("search", scalar_token(&filter.value));
            continue;
        }

        let token = filter.operator.backend_token();
        if filter.operator.is_multi_valued() {
            let key = format!("filters[{}][{}][]", filter.field, token);
            match &filter.value {
                Value::Array(items) => {
                    for item in items {
                        params.push(key.clone(), scalar_token(item));
                    }
                }
                single => params.push(key, scalar_token(single)),
            }
        } else {
            let key = format!("filters[{}][{}]", filter.field, token);
            params.push(key, scalar_token(&filter.value));
        }
    }

    for sort in sorts {
        params.push("sort[]", sort.token());
    }

    params
}

/// Renders a JSON scalar as a query-string value.
///
/// Strings are used verbatim; everything else uses its JSON representation.
fn scalar_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterOperator;
    use serde_json::json;

    #[test]
    fn test_equality_filter_translation() {
        let filters = vec![Filter::equals("status", "active")];
        let params = translate(&filters, &[]);
        assert_eq!(params.get("filters[status][$eq]"), Some("active"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_empty_value_omitted() {
        let filters = vec![
            Filter::equals("status", ""),
            Filter::equals("name", Value::Null),
            Filter::one_of("grade", Vec::<String>::new()),
        ];
        let params = translate(&filters, &[]);
        assert!(params.is_empty());
    }

    #[test]
    fn test_global_filter_becomes_search() {
        let filters = vec![Filter::global("smith")];
        let params = translate(&filters, &[]);
        assert_eq!(params.get("search"), Some("smith"));
        assert!(!params.contains_key("filters[global][$contains]"));
    }

    #[test]
    fn test_sort_order_preserved() {
        let sorts = vec![SortBy::asc("name"), SortBy::desc("age")];
        let params = translate(&[], &sorts);
        assert_eq!(params.get_all("sort[]"), vec!["name:asc", "age:desc"]);
        assert_eq!(
            params.to_query_string(),
            "sort%5B%5D=name%3Aasc&sort%5B%5D=age%3Adesc"
        );
    }

    #[test]
    fn test_multi_valued_operators() {
        let filters = vec![
            Filter::one_of("grade", [json!(7), json!(8)]),
            Filter::between("age", 10, 14),
        ];
        let params = translate(&filters, &[]);
        assert_eq!(params.get_all("filters[grade][$in][]"), vec!["7", "8"]);
        assert_eq!(params.get_all("filters[age][$between][]"), vec!["10", "14"]);
    }

    #[test]
    fn test_scalar_rendering() {
        let filters = vec![
            Filter::equals("count", 42),
            Filter::equals("enabled", true),
            Filter::new("ratio", FilterOperator::GreaterThan, 0.5),
        ];
        let params = translate(&filters, &[]);
        assert_eq!(params.get("filters[count][$eq]"), Some("42"));
        assert_eq!(params.get("filters[enabled][$eq]"), Some("true"));
        assert_eq!(params.get("filters[ratio][$gt]"), Some("0.5"));
    }

    #[test]
    fn test_nullity_operators() {
        let filters = vec![
            Filter::new("archived_at", FilterOperator::Is, true),
            Filter::new("deleted_at", FilterOperator::IsNot, true),
        ];
        let params = translate(&filters, &[]);
        assert_eq!(params.get("filters[archived_at][$null]"), Some("true"));
        assert_eq!(params.get("filters[deleted_at][$notNull]"), Some("true"));
    }

    #[test]
    fn test_filters_and_sorts_combined() {
        let filters = vec![Filter::equals("status", "active"), Filter::global("kim")];
        let sorts = vec![SortBy::asc("name")];
        let params = translate(&filters, &sorts);
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("filters[status][$eq]"), Some("active"));
        assert_eq!(params.get("search"), Some("kim"));
        assert_eq!(params.get("sort[]"), Some("name:asc"));
    }
}
