//! Store abstraction for the catalog tables.
//!
//! The reconciler never talks to a database directly. It consumes the five
//! per-row operations of [`CatalogStore`], so anything that can look rows up
//! by a unique key (SQLite, a document store, an in-memory map) can back it.
//!
//! Rows travel as JSON field maps keyed by column name. The surrogate `id`
//! lives beside the fields, never inside them.

use crate::core::error::CuratorError;
use serde_json::Value as JsonValue;
use std::fmt;

/// Column-name keyed row payload.
pub type Fields = serde_json::Map<String, JsonValue>;

/// The three catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Categories,
    Achievements,
    Items,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Categories => "categories",
            Table::Achievements => "achievements",
            Table::Items => "items",
        }
    }

    /// Column holding the unique lookup key used by `get_by_key`/`update`.
    pub fn key_column(&self) -> &'static str {
        match self {
            Table::Categories => "category_key",
            Table::Achievements => "achievement_key",
            Table::Items => "id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter accepted by `count_where`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { column: String, value: JsonValue },
}

impl Predicate {
    pub fn eq(column: &str, value: impl Into<JsonValue>) -> Self {
        Predicate::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } => column,
        }
    }

    /// Evaluate against a record. `id` is matched against the surrogate key.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Eq { column, value } if column == "id" => {
                value.as_str() == Some(record.id.as_str())
            }
            Predicate::Eq { column, value } => record.fields.get(column) == Some(value),
        }
    }
}

/// A stored row: surrogate id plus its column values.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    /// Value of the table's unique key column, if present.
    pub fn key(&self, table: Table) -> Option<&str> {
        match table {
            Table::Items => Some(self.id.as_str()),
            _ => self.fields.get(table.key_column()).and_then(JsonValue::as_str),
        }
    }
}

/// Per-row CRUD contract the catalog engine requires from its backing store.
///
/// Implementations own their own timeouts; every call is expected to return
/// in bounded time. None of the operations are transactional with respect to
/// each other.
pub trait CatalogStore {
    /// Fetch one row by its unique key.
    fn get_by_key(&self, table: Table, key: &str) -> Result<Option<Record>, CuratorError>;

    /// All unique keys currently present in `table`.
    fn list_keys(&self, table: Table) -> Result<Vec<String>, CuratorError>;

    /// Insert a new row and return its surrogate id.
    fn insert(&self, table: Table, row: Fields) -> Result<String, CuratorError>;

    /// Overwrite the given columns of the row identified by `key`.
    /// The key column itself is immutable and must not appear in `fields`.
    fn update(&self, table: Table, key: &str, fields: Fields) -> Result<(), CuratorError>;

    fn count_where(&self, table: Table, predicate: &Predicate) -> Result<u64, CuratorError>;
}

impl<S: CatalogStore + ?Sized> CatalogStore for &S {
    fn get_by_key(&self, table: Table, key: &str) -> Result<Option<Record>, CuratorError> {
        (**self).get_by_key(table, key)
    }

    fn list_keys(&self, table: Table) -> Result<Vec<String>, CuratorError> {
        (**self).list_keys(table)
    }

    fn insert(&self, table: Table, row: Fields) -> Result<String, CuratorError> {
        (**self).insert(table, row)
    }

    fn update(&self, table: Table, key: &str, fields: Fields) -> Result<(), CuratorError> {
        (**self).update(table, key, fields)
    }

    fn count_where(&self, table: Table, predicate: &Predicate) -> Result<u64, CuratorError> {
        (**self).count_where(table, predicate)
    }
}

impl<S: CatalogStore + ?Sized> CatalogStore for Box<S> {
    fn get_by_key(&self, table: Table, key: &str) -> Result<Option<Record>, CuratorError> {
        (**self).get_by_key(table, key)
    }

    fn list_keys(&self, table: Table) -> Result<Vec<String>, CuratorError> {
        (**self).list_keys(table)
    }

    fn insert(&self, table: Table, row: Fields) -> Result<String, CuratorError> {
        (**self).insert(table, row)
    }

    fn update(&self, table: Table, key: &str, fields: Fields) -> Result<(), CuratorError> {
        (**self).update(table, key, fields)
    }

    fn count_where(&self, table: Table, predicate: &Predicate) -> Result<u64, CuratorError> {
        (**self).count_where(table, predicate)
    }
}

/// Reject an update payload that tries to rewrite the key column.
pub(crate) fn ensure_key_untouched(table: Table, fields: &Fields) -> Result<(), CuratorError> {
    if fields.contains_key(table.key_column()) {
        return Err(CuratorError::StoreError(format!(
            "column '{}' of {} is immutable",
            table.key_column(),
            table
        )));
    }
    Ok(())
}
