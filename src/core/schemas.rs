//! Centralized schema definitions for the catalog database.
//!
//! Three tables make up the catalog:
//! 1. categories: the canonical category list, unique on `category_key`.
//! 2. achievements: the canonical achievement list, unique on `achievement_key`.
//! 3. items: per-category content; only ever seeded, never reconciled.
//!
//! `id`, `created_at` and `updated_at` are managed by the store and are not
//! part of the reconcilable column sets below.

use crate::core::store::Table;

pub const CATALOG_DB_NAME: &str = "curator.db";

pub const CATEGORIES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id TEXT PRIMARY KEY,
        category_key TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        icon TEXT NOT NULL,
        gradient TEXT NOT NULL,
        order_index INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const ACHIEVEMENTS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS achievements (
        id TEXT PRIMARY KEY,
        achievement_key TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        icon TEXT NOT NULL,
        color TEXT NOT NULL,
        criteria_type TEXT NOT NULL,
        criteria_value INTEGER NOT NULL,
        order_index INTEGER NOT NULL DEFAULT 0,
        tier TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const ITEMS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        category_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        file_type TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id)
    )
";

pub const ITEMS_CATEGORY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id)";

pub const ALL_STATEMENTS: &[&str] = &[
    CATEGORIES_SCHEMA,
    ACHIEVEMENTS_SCHEMA,
    ITEMS_SCHEMA,
    ITEMS_CATEGORY_INDEX,
];

/// Storage class of a column, used to map JSON values to SQLite and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

pub const CATEGORY_COLUMNS: &[Column] = &[
    col("category_key", ColumnKind::Text),
    col("name", ColumnKind::Text),
    col("description", ColumnKind::Text),
    col("icon", ColumnKind::Text),
    col("gradient", ColumnKind::Text),
    col("order_index", ColumnKind::Integer),
    col("is_active", ColumnKind::Bool),
];

pub const ACHIEVEMENT_COLUMNS: &[Column] = &[
    col("achievement_key", ColumnKind::Text),
    col("name", ColumnKind::Text),
    col("description", ColumnKind::Text),
    col("icon", ColumnKind::Text),
    col("color", ColumnKind::Text),
    col("criteria_type", ColumnKind::Text),
    col("criteria_value", ColumnKind::Integer),
    col("order_index", ColumnKind::Integer),
    col("tier", ColumnKind::Text),
];

pub const ITEM_COLUMNS: &[Column] = &[
    col("category_id", ColumnKind::Text),
    col("name", ColumnKind::Text),
    col("description", ColumnKind::Text),
    col("file_type", ColumnKind::Text),
    col("is_active", ColumnKind::Bool),
];

pub fn columns(table: Table) -> &'static [Column] {
    match table {
        Table::Categories => CATEGORY_COLUMNS,
        Table::Achievements => ACHIEVEMENT_COLUMNS,
        Table::Items => ITEM_COLUMNS,
    }
}

/// Look up a data column, treating `id` as a text column on every table.
pub fn find_column(table: Table, name: &str) -> Option<Column> {
    if name == "id" {
        return Some(col("id", ColumnKind::Text));
    }
    columns(table).iter().copied().find(|c| c.name == name)
}
