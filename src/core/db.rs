use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tracing::debug;

const BUSY_TIMEOUT_SECS: u64 = 5;

pub fn db_connect(db_path: &str) -> Result<Connection, error::CuratorError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(BUSY_TIMEOUT_SECS))
        .map_err(error::CuratorError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::CuratorError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::CuratorError::RusqliteError)?;
    Ok(conn)
}

/// In-memory connection with the same pragmas (WAL does not apply).
pub fn db_connect_in_memory() -> Result<Connection, error::CuratorError> {
    let conn = Connection::open_in_memory()?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::CuratorError::RusqliteError)?;
    Ok(conn)
}

pub fn ensure_parent_dir(db_path: &Path) -> Result<(), error::CuratorError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(error::CuratorError::IoError)?;
        }
    }
    Ok(())
}

/// Create the catalog tables if they do not exist yet.
pub fn initialize_catalog_db(conn: &Connection) -> Result<(), error::CuratorError> {
    for stmt in schemas::ALL_STATEMENTS {
        conn.execute(stmt, [])?;
    }
    debug!("catalog schema initialized");
    Ok(())
}
