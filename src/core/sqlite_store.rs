//! SQLite-backed [`CatalogStore`].
//!
//! Column names arriving in a row payload are checked against the static
//! column sets in `schemas` before any SQL is built, so only known
//! identifiers are ever interpolated into statements.

use crate::core::db;
use crate::core::error::CuratorError;
use crate::core::schemas::{self, Column, ColumnKind};
use crate::core::store::{self, CatalogStore, Fields, Predicate, Record, Table};
use crate::core::time;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, CuratorError> {
        db::ensure_parent_dir(path)?;
        let conn = db::db_connect(&path.to_string_lossy())?;
        db::initialize_catalog_db(&conn)?;
        debug!(path = %path.display(), "opened catalog store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, CuratorError> {
        let conn = db::db_connect_in_memory()?;
        db::initialize_catalog_db(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw connection, for callers that mutate the catalog outside the engine.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn column_for(table: Table, name: &str) -> Result<Column, CuratorError> {
    schemas::find_column(table, name).ok_or_else(|| CuratorError::UnknownColumn {
        table: table.to_string(),
        column: name.to_string(),
    })
}

fn to_sql_value(column: Column, value: &JsonValue) -> Result<SqlValue, CuratorError> {
    let converted = match (column.kind, value) {
        (_, JsonValue::Null) => Some(SqlValue::Null),
        (ColumnKind::Text, JsonValue::String(s)) => Some(SqlValue::Text(s.clone())),
        (ColumnKind::Integer, JsonValue::Number(n)) => n.as_i64().map(SqlValue::Integer),
        (ColumnKind::Bool, JsonValue::Bool(b)) => Some(SqlValue::Integer(i64::from(*b))),
        _ => None,
    };
    converted.ok_or_else(|| {
        CuratorError::StoreError(format!(
            "value {} does not fit column '{}' ({:?})",
            value, column.name, column.kind
        ))
    })
}

fn from_sql_value(kind: ColumnKind, value: SqlValue) -> JsonValue {
    match (kind, value) {
        (_, SqlValue::Null) => JsonValue::Null,
        (ColumnKind::Bool, SqlValue::Integer(i)) => JsonValue::Bool(i != 0),
        (_, SqlValue::Integer(i)) => JsonValue::from(i),
        (_, SqlValue::Real(f)) => JsonValue::from(f),
        (_, SqlValue::Text(s)) => JsonValue::String(s),
        (_, SqlValue::Blob(b)) => JsonValue::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Split a payload into (column names, SQL values), rejecting unknown columns.
fn bind_fields(table: Table, fields: &Fields) -> Result<(Vec<&'static str>, Vec<SqlValue>), CuratorError> {
    let mut names = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let column = column_for(table, name)?;
        names.push(column.name);
        values.push(to_sql_value(column, value)?);
    }
    Ok((names, values))
}

impl CatalogStore for SqliteStore {
    fn get_by_key(&self, table: Table, key: &str) -> Result<Option<Record>, CuratorError> {
        let columns = schemas::columns(table);
        let select = columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT id, {} FROM {} WHERE {} = ?1",
            select,
            table.name(),
            table.key_column()
        );
        let record = self
            .conn
            .query_row(&sql, [key], |row| {
                let id: String = row.get(0)?;
                let mut fields = Fields::new();
                for (i, column) in columns.iter().enumerate() {
                    let raw: SqlValue = row.get(i + 1)?;
                    fields.insert(column.name.to_string(), from_sql_value(column.kind, raw));
                }
                Ok(Record { id, fields })
            })
            .optional()?;
        Ok(record)
    }

    fn list_keys(&self, table: Table) -> Result<Vec<String>, CuratorError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            table.key_column(),
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for r in rows {
            keys.push(r?);
        }
        Ok(keys)
    }

    fn insert(&self, table: Table, row: Fields) -> Result<String, CuratorError> {
        let (mut names, mut values) = bind_fields(table, &row)?;
        if names.contains(&"id") {
            return Err(CuratorError::StoreError(format!(
                "{} ids are assigned by the store",
                table
            )));
        }

        let id = time::new_row_id();
        let now = time::row_timestamp();
        names.extend(["id", "created_at", "updated_at"]);
        values.extend([SqlValue::Text(id.clone()), SqlValue::Text(now.clone()), SqlValue::Text(now)]);

        let placeholders = (1..=values.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {}({}) VALUES({})",
            table.name(),
            names.join(", "),
            placeholders
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(id)
    }

    fn update(&self, table: Table, key: &str, fields: Fields) -> Result<(), CuratorError> {
        store::ensure_key_untouched(table, &fields)?;
        let (names, mut values) = bind_fields(table, &fields)?;

        let mut assignments = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", name, i + 1))
            .collect::<Vec<_>>();
        assignments.push(format!("updated_at = ?{}", values.len() + 1));
        values.push(SqlValue::Text(time::row_timestamp()));
        values.push(SqlValue::Text(key.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            table.name(),
            assignments.join(", "),
            table.key_column(),
            values.len()
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(CuratorError::NotFound(format!("{} row '{}'", table, key)));
        }
        Ok(())
    }

    fn count_where(&self, table: Table, predicate: &Predicate) -> Result<u64, CuratorError> {
        let Predicate::Eq { column, value } = predicate;
        let column = column_for(table, column)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            table.name(),
            column.name
        );
        let count: i64 = self
            .conn
            .query_row(&sql, [to_sql_value(column, value)?], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
