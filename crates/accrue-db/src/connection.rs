//! Database connection handling.
//!
//! Every model handle and query shares one SQLite connection behind a
//! mutex. The helpers here are the only place statements are executed, so
//! each one is logged the same way.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::{types::Value, Connection, Row, ToSql};
use tracing::debug;

use crate::error::{DbError, Result};

/// Shared database handle.
pub type Db = Arc<Mutex<Connection>>;

/// Opens (or creates) a database file.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Db> {
    let conn = Connection::open(path.as_ref())?;

    // WAL mode for better concurrent access
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    debug!(path = %path.as_ref().display(), "opened database");
    Ok(Arc::new(Mutex::new(conn)))
}

/// Opens a private in-memory database.
pub fn open_in_memory() -> Result<Db> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Locks the connection, surfacing a poisoned mutex as an error.
pub fn lock(db: &Db) -> Result<MutexGuard<'_, Connection>> {
    db.lock().map_err(|_| DbError::Poisoned)
}

pub(crate) fn query_map<T, F>(db: &Db, sql: &str, params: &[Value], f: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!(sql, params = params.len(), "executing query");
    let conn = lock(db)?;
    let mut stmt = conn.prepare(sql)?;

    let params_ref: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let rows = stmt
        .query_map(params_ref.as_slice(), f)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn query_one<T, F>(db: &Db, sql: &str, params: &[Value], f: F) -> Result<Option<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    Ok(query_map(db, sql, params, f)?.into_iter().next())
}

pub(crate) fn execute(db: &Db, sql: &str, params: &[Value]) -> Result<usize> {
    debug!(sql, params = params.len(), "executing statement");
    let conn = lock(db)?;

    let params_ref: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    Ok(conn.execute(sql, params_ref.as_slice())?)
}
