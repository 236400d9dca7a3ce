//! Row identity and column types.

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// A row served by the table engine.
///
/// Rows are opaque to the engine: the only thing it ever reads is the
/// identifier, used for selection and bulk actions. Everything else is
/// carried through untouched.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use windrow::{RowId, TableRow};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Student {
///     id: i64,
///     name: String,
/// }
///
/// impl TableRow for Student {
///     fn row_id(&self) -> RowId {
///         RowId::from(self.id)
///     }
/// }
/// ```
pub trait TableRow: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The unique identifier of this row.
    fn row_id(&self) -> RowId;
}

/// A row identifier.
///
/// Backends key rows by integer, UUID, or opaque string primary keys; the
/// engine treats all three uniformly. Serializes untagged, so identifiers
/// appear on the wire exactly as the backend sent them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    /// Integer primary key.
    Int(i64),
    /// UUID primary key.
    Uuid(Uuid),
    /// Opaque string key.
    Text(String),
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for RowId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<u32> for RowId {
    fn from(id: u32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<Uuid> for RowId {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Uuid(id) => write!(f, "{id}"),
            Self::Text(id) => write!(f, "{id}"),
        }
    }
}

/// A column of the table, as given at construction.
///
/// The engine uses columns for the `visible_only` export projection and the
/// visible/hidden read surface; it never inspects cell values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Field name, matching the row's serialized property.
    pub field: String,
    /// Whether the column is currently visible.
    pub visible: bool,
}

impl Column {
    /// Creates a visible column.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            visible: true,
        }
    }

    /// Marks the column as hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}
