//! The storage engine contract.
//!
//! The engine is synchronous: every statement runs to completion before the next
//! one is issued, and relationship graphs depend on that ordering.

use crate::error::{Error, QueryErrorKind, Result};
use crate::row::Row;
use crate::value::Value;

/// SQL that reads back the most recently inserted rowid of `table`.
#[must_use]
pub fn last_insert_rowid_sql(table: &str) -> String {
    format!("SELECT ROWID FROM {} ORDER BY ROWID DESC LIMIT 1", table)
}

/// A connection to a SQL storage engine.
///
/// Parameters are positional: `?1` in the statement binds `params[0]`.
pub trait Connection {
    /// Execute a statement that returns no rows. Returns the number of rows changed.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a query and collect every row.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// The id generated by the most recent insert into `table`.
    ///
    /// The default reads the highest rowid of the table, which is only correct when
    /// no other writer shares the table. Drivers with a native "last insert id"
    /// should override it.
    fn query_last_inserted_id(&self, table: &str) -> Result<i64> {
        let sql = last_insert_rowid_sql(table);
        let rows = self.query(&sql, &[])?;
        rows.first()
            .and_then(|row| row.get_i64(0))
            .ok_or_else(|| {
                Error::query(
                    QueryErrorKind::NotFound,
                    format!("no rows in {} after insert", table),
                )
            })
    }

    /// Start a transaction.
    fn begin(&self) -> Result<()> {
        self.execute("BEGIN", &[]).map(|_| ())
    }

    /// Commit the current transaction.
    fn commit(&self) -> Result<()> {
        self.execute("COMMIT", &[]).map(|_| ())
    }

    /// Roll back the current transaction.
    fn rollback(&self) -> Result<()> {
        self.execute("ROLLBACK", &[]).map(|_| ())
    }
}
