//! SQLite driver for Shillelagh.
//!
//! `shillelagh-sqlite` implements `shillelagh_core::Connection` on top of
//! [`rusqlite`], using the bundled SQLite library.
//!
//! # Role In The Architecture
//!
//! - **Storage engine**: executes the DDL and DML the facade produces and reads rows
//!   back for id retrieval and tests.
//! - **Value bridge**: converts `Value` to and from SQLite's storage classes.
//!
//! # Example
//!
//! ```ignore
//! let conn = SqliteConnection::open_memory()?;
//! let orm = Shillelagh::new(conn);
//! ```

pub mod value;

use std::path::Path;

use rusqlite::ErrorCode;
use shillelagh_core::{
    Connection, ConnectionError, Error, QueryError, QueryErrorKind, Result, Row,
};

use crate::value::{Param, from_sql};

/// A single SQLite database connection.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = rusqlite::Connection::open(path).map_err(|e| connection_error(e, path.display()))?;
        tracing::info!(path = %path.display(), "Opened SQLite database");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(|e| connection_error(e, ":memory:"))?;
        tracing::info!("Opened in-memory SQLite database");
        Ok(Self { conn })
    }

    /// Wrap an existing rusqlite connection.
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// The underlying rusqlite connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    fn execute(&self, sql: &str, params: &[shillelagh_core::Value]) -> Result<u64> {
        tracing::trace!(sql, params = params.len(), "execute");
        let mut stmt = self.conn.prepare_cached(sql).map_err(|e| query_error(e, sql))?;
        let changed = stmt
            .execute(rusqlite::params_from_iter(params.iter().map(Param)))
            .map_err(|e| query_error(e, sql))?;
        Ok(changed as u64)
    }

    fn query(&self, sql: &str, params: &[shillelagh_core::Value]) -> Result<Vec<Row>> {
        tracing::trace!(sql, params = params.len(), "query");
        let mut stmt = self.conn.prepare_cached(sql).map_err(|e| query_error(e, sql))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let count = columns.len();

        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter().map(Param)), |row| {
                (0..count)
                    .map(|i| row.get::<_, rusqlite::types::Value>(i).map(from_sql))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| query_error(e, sql))?;

        let rows: Result<Vec<Row>> = rows
            .map(|values| {
                values
                    .map(|values| Row::new(columns.clone(), values))
                    .map_err(|e| query_error(e, sql))
            })
            .collect();
        rows
    }

    /// Uses SQLite's connection-scoped last insert rowid, which is exact even when
    /// other connections write to the same table.
    fn query_last_inserted_id(&self, table: &str) -> Result<i64> {
        let id = self.conn.last_insert_rowid();
        tracing::trace!(table, id, "last insert rowid");
        Ok(id)
    }
}

fn connection_error(err: rusqlite::Error, target: impl std::fmt::Display) -> Error {
    Error::Connection(ConnectionError {
        message: format!("failed to open {}: {}", target, err),
        source: Some(Box::new(err)),
    })
}

fn query_error(err: rusqlite::Error, sql: &str) -> Error {
    let message = err.to_string();
    let kind = match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            QueryErrorKind::Constraint
        }
        rusqlite::Error::QueryReturnedNoRows => QueryErrorKind::NotFound,
        _ if message.contains("syntax error") || message.contains("no such") => QueryErrorKind::Syntax,
        _ => QueryErrorKind::Database,
    };
    Error::Query(QueryError {
        kind,
        message,
        sql: Some(sql.to_string()),
        source: Some(Box::new(err)),
    })
}
