//! In-process [`CatalogStore`] with fault injection.
//!
//! Enforces the same constraints as the SQLite schema (unique key columns,
//! item → category references) so engine behavior is identical across both.
//! Faults make individual operations fail on demand, which is how tests
//! exercise per-entity failure isolation and the fail-safe verifier.

use crate::core::error::CuratorError;
use crate::core::schemas;
use crate::core::store::{self, CatalogStore, Fields, Predicate, Record, Table};
use crate::core::time;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    GetByKey,
    ListKeys,
    Insert,
    Update,
    CountWhere,
}

#[derive(Debug, Clone)]
struct Fault {
    table: Table,
    op: StoreOp,
    /// `None` fails every call of `op` on `table`.
    key: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    tables: FxHashMap<Table, Vec<Record>>,
    faults: Vec<Fault>,
    unreachable: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, CuratorError> {
        self.inner
            .lock()
            .map_err(|_| CuratorError::StoreError("MemoryStore lock poisoned".to_string()))
    }

    /// Make `op` on `table` fail, for one key or (with `None`) for all.
    pub fn fail_on(&self, table: Table, op: StoreOp, key: Option<&str>) {
        if let Ok(mut inner) = self.lock() {
            inner.faults.push(Fault {
                table,
                op,
                key: key.map(str::to_string),
            });
        }
    }

    /// Every operation fails while unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut inner) = self.lock() {
            inner.unreachable = unreachable;
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.faults.clear();
            inner.unreachable = false;
        }
    }

    /// Snapshot of every row in `table`.
    pub fn rows(&self, table: Table) -> Vec<Record> {
        self.lock()
            .map(|inner| inner.tables.get(&table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Delete a row out from under the engine, as an external writer would.
    pub fn remove(&self, table: Table, key: &str) -> bool {
        let Ok(mut inner) = self.lock() else {
            return false;
        };
        let rows = inner.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| r.key(table) != Some(key));
        rows.len() != before
    }
}

impl Inner {
    fn check(&self, table: Table, op: StoreOp, key: Option<&str>) -> Result<(), CuratorError> {
        if self.unreachable {
            return Err(CuratorError::StoreError("store unreachable".to_string()));
        }
        let tripped = self.faults.iter().any(|f| {
            f.table == table && f.op == op && (f.key.is_none() || f.key.as_deref() == key)
        });
        if tripped {
            return Err(CuratorError::StoreError(format!(
                "injected {:?} failure on {}{}",
                op,
                table,
                key.map(|k| format!(" '{}'", k)).unwrap_or_default()
            )));
        }
        Ok(())
    }

    fn rows(&self, table: Table) -> &[Record] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or_default()
    }
}

fn check_columns(table: Table, fields: &Fields) -> Result<(), CuratorError> {
    for name in fields.keys() {
        if name == "id" || schemas::find_column(table, name).is_none() {
            return Err(CuratorError::UnknownColumn {
                table: table.to_string(),
                column: name.clone(),
            });
        }
    }
    Ok(())
}

impl CatalogStore for MemoryStore {
    fn get_by_key(&self, table: Table, key: &str) -> Result<Option<Record>, CuratorError> {
        let inner = self.lock()?;
        inner.check(table, StoreOp::GetByKey, Some(key))?;
        Ok(inner
            .rows(table)
            .iter()
            .find(|r| r.key(table) == Some(key))
            .cloned())
    }

    fn list_keys(&self, table: Table) -> Result<Vec<String>, CuratorError> {
        let inner = self.lock()?;
        inner.check(table, StoreOp::ListKeys, None)?;
        Ok(inner
            .rows(table)
            .iter()
            .filter_map(|r| r.key(table).map(str::to_string))
            .collect())
    }

    fn insert(&self, table: Table, row: Fields) -> Result<String, CuratorError> {
        let mut inner = self.lock()?;
        let subject = row.get(table.key_column()).and_then(JsonValue::as_str);
        inner.check(table, StoreOp::Insert, subject)?;
        check_columns(table, &row)?;

        if let Some(key) = subject {
            if inner.rows(table).iter().any(|r| r.key(table) == Some(key)) {
                return Err(CuratorError::StoreError(format!(
                    "duplicate key value violates unique constraint on {}.{} ('{}')",
                    table,
                    table.key_column(),
                    key
                )));
            }
        }
        if table == Table::Items {
            let parent = row.get("category_id").and_then(JsonValue::as_str);
            let exists = parent.is_some_and(|id| {
                inner.rows(Table::Categories).iter().any(|c| c.id == id)
            });
            if !exists {
                return Err(CuratorError::StoreError(
                    "items.category_id references a missing category".to_string(),
                ));
            }
        }

        let id = time::new_row_id();
        inner.tables.entry(table).or_default().push(Record {
            id: id.clone(),
            fields: row,
        });
        Ok(id)
    }

    fn update(&self, table: Table, key: &str, fields: Fields) -> Result<(), CuratorError> {
        let mut inner = self.lock()?;
        inner.check(table, StoreOp::Update, Some(key))?;
        store::ensure_key_untouched(table, &fields)?;
        check_columns(table, &fields)?;

        let record = inner
            .tables
            .entry(table)
            .or_default()
            .iter_mut()
            .find(|r| r.key(table) == Some(key))
            .ok_or_else(|| CuratorError::NotFound(format!("{} row '{}'", table, key)))?;
        record.fields.extend(fields);
        Ok(())
    }

    fn count_where(&self, table: Table, predicate: &Predicate) -> Result<u64, CuratorError> {
        let inner = self.lock()?;
        inner.check(table, StoreOp::CountWhere, None)?;
        if schemas::find_column(table, predicate.column()).is_none() {
            return Err(CuratorError::UnknownColumn {
                table: table.to_string(),
                column: predicate.column().to_string(),
            });
        }
        let count = inner
            .rows(table)
            .iter()
            .filter(|r| predicate.matches(r))
            .count();
        Ok(count as u64)
    }
}
