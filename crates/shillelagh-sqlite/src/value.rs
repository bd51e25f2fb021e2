//! Conversion between Shillelagh values and SQLite values.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use shillelagh_core::Value;

/// A borrowed Shillelagh value bound as a statement parameter.
#[derive(Debug)]
pub struct Param<'a>(pub &'a Value);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self.0 {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::TinyInt(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::SmallInt(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::BigInt(v) | Value::Timestamp(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*v))),
            Value::Double(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        };
        Ok(out)
    }
}

/// Convert a column value read from SQLite.
///
/// SQLite only reports storage classes, so integers come back as `BigInt` and reals
/// as `Double`.
pub fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::BigInt(v),
        SqlValue::Real(v) => Value::Double(v),
        SqlValue::Text(v) => Value::Text(v),
        SqlValue::Blob(v) => Value::Bytes(v),
    }
}
