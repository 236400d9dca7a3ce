//! Sort ordering types.

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Parses a direction token. Anything other than exactly `"asc"` is
    /// descending.
    pub fn parse(token: &str) -> Self {
        if token == "asc" { Self::Asc } else { Self::Desc }
    }

    /// Returns the normalized token, `"asc"` or `"desc"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::parse(&token))
    }
}

/// One entry of a multi-column sort.
///
/// Sort lists are ordered: the first entry is the primary sort and the order
/// is preserved verbatim when translated for the backend.
///
/// # Example
///
/// ```
/// use windrow::query::SortBy;
///
/// let sorts = vec![SortBy::asc("name"), SortBy::desc("age")];
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    /// The column field to sort by.
    pub field: String,
    /// The sort direction.
    #[serde(alias = "order")]
    pub direction: Direction,
}

impl SortBy {
    /// Creates a new sort entry.
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Creates an ascending sort entry.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Asc)
    }

    /// Creates a descending sort entry.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Desc)
    }

    /// Returns the `field:direction` token sent to the backend.
    pub fn token(&self) -> String {
        format!("{}:{}", self.field, self.direction.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("asc"), Direction::Asc);
        assert_eq!(Direction::parse("desc"), Direction::Desc);
        assert_eq!(Direction::parse("ASC"), Direction::Desc);
        assert_eq!(Direction::parse("ascending"), Direction::Desc);
        assert_eq!(Direction::parse(""), Direction::Desc);
    }

    #[test]
    fn test_sort_token() {
        assert_eq!(SortBy::asc("name").token(), "name:asc");
        assert_eq!(SortBy::desc("age").token(), "age:desc");
    }

    #[test]
    fn test_deserializes_from_ui_event() {
        let sort: SortBy = serde_json::from_value(json!({"field": "name", "order": "asc"})).unwrap();
        assert_eq!(sort, SortBy::asc("name"));

        let sort: SortBy =
            serde_json::from_value(json!({"field": "age", "direction": "whatever"})).unwrap();
        assert_eq!(sort, SortBy::desc("age"));
    }
}
