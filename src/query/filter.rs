//! Column filter types.

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde_json::Value;

/// Reserved filter field for full-text search across all searchable columns.
pub const GLOBAL_FIELD: &str = "global";

/// A column filter condition supplied by the UI layer.
///
/// Filters pair a field name with an operator and a JSON value. A filter on
/// the reserved [`GLOBAL_FIELD`] is sent as the `search` parameter instead of
/// the operator map. Filters with an empty value (JSON null, empty string,
/// or empty array) are never sent to the server.
///
/// # Example
///
/// ```
/// use windrow::query::Filter;
///
/// let filter = Filter::equals("status", "active");
/// let search = Filter::global("smith");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// The column field this filter applies to.
    pub field: String,
    /// The comparison operator.
    pub operator: FilterOperator,
    /// The comparison value as supplied by the UI.
    pub value: Value,
}

impl Filter {
    /// Creates a new filter.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates an equality filter.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Equals, value)
    }

    /// Creates a containment filter.
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Contains, value)
    }

    /// Creates a starts-with filter.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::StartsWith, value)
    }

    /// Creates a less-than filter.
    pub fn less_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::LessThan, value)
    }

    /// Creates a greater-than filter.
    pub fn greater_than(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value)
    }

    /// Creates a membership filter from a list of values.
    pub fn one_of(field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Creates a range filter from a lower and upper bound.
    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(
            field,
            FilterOperator::Between,
            Value::Array(vec![low.into(), high.into()]),
        )
    }

    /// Creates a full-text search filter on the reserved global field.
    pub fn global(term: impl Into<Value>) -> Self {
        Self::new(GLOBAL_FIELD, FilterOperator::Contains, term)
    }

    /// Returns `true` if this is the reserved full-text search filter.
    pub fn is_global(&self) -> bool {
        self.field == GLOBAL_FIELD
    }

    /// Returns `true` if the filter carries a usable value.
    ///
    /// JSON null, the empty string, and the empty array all count as absent;
    /// such filters are omitted from outgoing requests.
    pub fn has_value(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}

/// The closed set of filter operators understood by the engine.
///
/// Each operator maps to exactly one backend token; the mapping is total and
/// fixed. Date-specific operators are aliases that resolve to the plain
/// equality/ordering tokens. Unknown operator strings coming from the UI fail
/// closed to [`FilterOperator::Equals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Substring containment.
    Contains,
    /// Negated substring containment.
    NotContains,
    /// Case-insensitive substring containment.
    ContainsIgnoreCase,
    /// Negated case-insensitive substring containment.
    NotContainsIgnoreCase,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Equality.
    Equals,
    /// Negated equality.
    NotEquals,
    /// Case-insensitive equality.
    EqualsIgnoreCase,
    /// Negated case-insensitive equality.
    NotEqualsIgnoreCase,
    /// Strictly less than.
    LessThan,
    /// Less than or equal.
    LessThanOrEqual,
    /// Strictly greater than.
    GreaterThan,
    /// Greater than or equal.
    GreaterThanOrEqual,
    /// Membership in a value list.
    In,
    /// Exclusion from a value list.
    NotIn,
    /// Inclusive range test against a two-element list.
    Between,
    /// Negated inclusive range test.
    NotBetween,
    /// Null test.
    Is,
    /// Negated null test.
    IsNot,
    /// Date equality, resolves to the equality token.
    DateIs,
    /// Negated date equality, resolves to the not-equal token.
    DateIsNot,
    /// Date strictly before, resolves to the less-than token.
    DateBefore,
    /// Date strictly after, resolves to the greater-than token.
    DateAfter,
}

impl FilterOperator {
    /// Returns the backend query token for this operator.
    pub fn backend_token(&self) -> &'static str {
        match self {
            Self::Contains => "$contains",
            Self::NotContains => "$notContains",
            Self::ContainsIgnoreCase => "$containsi",
            Self::NotContainsIgnoreCase => "$notContainsi",
            Self::StartsWith => "$startsWith",
            Self::EndsWith => "$endsWith",
            Self::Equals | Self::DateIs => "$eq",
            Self::NotEquals | Self::DateIsNot => "$ne",
            Self::EqualsIgnoreCase => "$eqi",
            Self::NotEqualsIgnoreCase => "$nei",
            Self::LessThan | Self::DateBefore => "$lt",
            Self::LessThanOrEqual => "$lte",
            Self::GreaterThan | Self::DateAfter => "$gt",
            Self::GreaterThanOrEqual => "$gte",
            Self::In => "$in",
            Self::NotIn => "$notIn",
            Self::Between => "$between",
            Self::NotBetween => "$notBetween",
            Self::Is => "$null",
            Self::IsNot => "$notNull",
        }
    }

    /// Returns the UI-level token for this operator.
    pub fn ui_token(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::ContainsIgnoreCase => "containsi",
            Self::NotContainsIgnoreCase => "notContainsi",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::EqualsIgnoreCase => "equalsi",
            Self::NotEqualsIgnoreCase => "notEqualsi",
            Self::LessThan => "lt",
            Self::LessThanOrEqual => "lte",
            Self::GreaterThan => "gt",
            Self::GreaterThanOrEqual => "gte",
            Self::In => "in",
            Self::NotIn => "notIn",
            Self::Between => "between",
            Self::NotBetween => "notBetween",
            Self::Is => "is",
            Self::IsNot => "isNot",
            Self::DateIs => "dateIs",
            Self::DateIsNot => "dateIsNot",
            Self::DateBefore => "dateBefore",
            Self::DateAfter => "dateAfter",
        }
    }

    /// Parses a UI-level operator token.
    ///
    /// Unknown tokens fail closed to [`FilterOperator::Equals`].
    pub fn from_ui_token(token: &str) -> Self {
        match token {
            "contains" => Self::Contains,
            "notContains" => Self::NotContains,
            "containsi" => Self::ContainsIgnoreCase,
            "notContainsi" => Self::NotContainsIgnoreCase,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            "equals" => Self::Equals,
            "notEquals" => Self::NotEquals,
            "equalsi" => Self::EqualsIgnoreCase,
            "notEqualsi" => Self::NotEqualsIgnoreCase,
            "lt" => Self::LessThan,
            "lte" => Self::LessThanOrEqual,
            "gt" => Self::GreaterThan,
            "gte" => Self::GreaterThanOrEqual,
            "in" => Self::In,
            "notIn" => Self::NotIn,
            "between" => Self::Between,
            "notBetween" => Self::NotBetween,
            "is" => Self::Is,
            "isNot" => Self::IsNot,
            "dateIs" => Self::DateIs,
            "dateIsNot" => Self::DateIsNot,
            "dateBefore" => Self::DateBefore,
            "dateAfter" => Self::DateAfter,
            _ => Self::Equals,
        }
    }

    /// Returns `true` if this operator expects a list value, emitted as one
    /// parameter per element.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::Between | Self::NotBetween)
    }
}

impl Serialize for FilterOperator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.ui_token())
    }
}

impl<'de> Deserialize<'de> for FilterOperator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_ui_token(&token))
    }
}
