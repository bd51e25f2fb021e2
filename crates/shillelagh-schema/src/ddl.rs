//! SQLite DDL for model tables.
//!
//! Identifiers are emitted unquoted; the table registry only admits plain SQL
//! identifiers, so no quoting is needed.

use shillelagh_core::TableObject;

/// `CREATE TABLE` for a table descriptor.
///
/// The id column comes first as `INTEGER PRIMARY KEY` (an alias of SQLite's rowid),
/// followed by every column in declaration order.
#[must_use]
pub fn create_table_sql(table: &TableObject) -> String {
    let mut defs = Vec::with_capacity(table.columns().len() + 1);
    defs.push(format!("{} INTEGER PRIMARY KEY", table.id_column_name()));
    for column in table.columns() {
        defs.push(format!("{} {}", column.column_name, column.storage_type));
    }

    let sql = format!("CREATE TABLE {} ({})", table.table_name(), defs.join(", "));
    tracing::debug!(table = table.table_name(), sql = %sql, "Generated CREATE TABLE");
    sql
}

/// `DROP TABLE IF EXISTS`, so dropping a missing table is not an error.
#[must_use]
pub fn drop_table_sql(table: &TableObject) -> String {
    format!("DROP TABLE IF EXISTS {}", table.table_name())
}
