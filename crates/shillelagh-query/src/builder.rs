//! Statement builders for INSERT and UPDATE.
//!
//! Both builders pair columns and values in the declaration order of the
//! `TableObject`, so the same row always renders to the same statement.
//!
//! Values are rendered according to a [`StatementMode`]:
//! - `Literal` inlines every value as SQL text (text quoted, dates as epoch
//!   milliseconds, booleans as `1`/`0`). Blobs have no literal form and are still
//!   bound as `?N` parameters.
//! - `Bound` renders every value as a `?N` placeholder and returns the values as
//!   parameters.

use serde::{Deserialize, Serialize};
use shillelagh_core::{Model, Result, TableObject, Value};

/// How values are rendered into statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementMode {
    /// Inline values into the SQL text. Blobs are still bound.
    Literal,
    /// Bind every value as a positional parameter.
    #[default]
    Bound,
}

/// SQL text plus the parameters its `?N` placeholders refer to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// True when the statement carries no bound parameters.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.params.is_empty()
    }
}

/// Renders values and collects the parameters for one statement.
struct Renderer {
    mode: StatementMode,
    params: Vec<Value>,
}

impl Renderer {
    fn new(mode: StatementMode) -> Self {
        Self {
            mode,
            params: Vec::new(),
        }
    }

    fn render(&mut self, value: Value) -> String {
        if self.mode == StatementMode::Literal {
            if let Some(literal) = value.to_sql_literal() {
                return literal;
            }
        }
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}

/// Values of `row` in the column order of `table`. Columns missing from the row
/// are NULL; entries that are not columns of the table are ignored.
fn ordered_values<'t>(table: &'t TableObject, mut row: Vec<(&'static str, Value)>) -> Vec<(&'t str, Value)> {
    table
        .columns()
        .iter()
        .map(|column| {
            let value = row
                .iter_mut()
                .find(|(name, _)| *name == column.column_name)
                .map_or(Value::Null, |(_, value)| std::mem::replace(value, Value::Null));
            (column.column_name.as_str(), value)
        })
        .collect()
}

/// INSERT statement builder.
///
/// # Example
///
/// ```ignore
/// let stmt = InsertBuilder::from_model(&table, &hero)?
///     .mode(StatementMode::Literal)
///     .build();
/// conn.execute(&stmt.sql, &stmt.params)?;
/// ```
#[derive(Debug)]
pub struct InsertBuilder<'a> {
    table: &'a TableObject,
    row: Vec<(&'static str, Value)>,
    mode: StatementMode,
}

impl<'a> InsertBuilder<'a> {
    /// Create a builder for an explicit row.
    pub fn new(table: &'a TableObject, row: Vec<(&'static str, Value)>) -> Self {
        Self {
            table,
            row,
            mode: StatementMode::default(),
        }
    }

    /// Create a builder from a model instance's current column values.
    pub fn from_model(table: &'a TableObject, model: &dyn Model) -> Result<Self> {
        Ok(Self::new(table, model.to_row()?))
    }

    /// Set the rendering mode.
    pub fn mode(mut self, mode: StatementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the INSERT statement.
    ///
    /// A table with no columns besides its id inserts `DEFAULT VALUES`.
    pub fn build(self) -> Statement {
        let mut renderer = Renderer::new(self.mode);
        let values = ordered_values(self.table, self.row);

        if values.is_empty() {
            return renderer.finish(format!("INSERT INTO {} DEFAULT VALUES", self.table.table_name()));
        }

        let columns: Vec<&str> = values.iter().map(|(name, _)| *name).collect();
        let rendered: Vec<String> = values
            .into_iter()
            .map(|(_, value)| renderer.render(value))
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table.table_name(),
            columns.join(", "),
            rendered.join(", ")
        );
        tracing::trace!(table = self.table.table_name(), sql = %sql, "Built INSERT");
        renderer.finish(sql)
    }
}

/// UPDATE statement builder, keyed by the row's id.
#[derive(Debug)]
pub struct UpdateBuilder<'a> {
    table: &'a TableObject,
    row: Vec<(&'static str, Value)>,
    id: i64,
    mode: StatementMode,
}

impl<'a> UpdateBuilder<'a> {
    /// Create a builder for an explicit row and id.
    pub fn new(table: &'a TableObject, row: Vec<(&'static str, Value)>, id: i64) -> Self {
        Self {
            table,
            row,
            id,
            mode: StatementMode::default(),
        }
    }

    /// Create a builder from a model instance's current column values.
    pub fn from_model(table: &'a TableObject, model: &dyn Model, id: i64) -> Result<Self> {
        Ok(Self::new(table, model.to_row()?, id))
    }

    /// Set the rendering mode.
    pub fn mode(mut self, mode: StatementMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the UPDATE statement.
    ///
    /// Returns `None` when the table has no columns besides its id, since there is
    /// nothing to set.
    pub fn build(self) -> Option<Statement> {
        let values = ordered_values(self.table, self.row);
        if values.is_empty() {
            return None;
        }

        let mut renderer = Renderer::new(self.mode);
        let assignments: Vec<String> = values
            .into_iter()
            .map(|(name, value)| format!("{} = {}", name, renderer.render(value)))
            .collect();
        let id = renderer.render(Value::BigInt(self.id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table.table_name(),
            assignments.join(", "),
            self.table.id_column_name(),
            id
        );
        tracing::trace!(table = self.table.table_name(), sql = %sql, "Built UPDATE");
        Some(renderer.finish(sql))
    }
}

/// Literal INSERT for a row; blobs are the only parameters.
#[must_use]
pub fn insert_sql(table: &TableObject, row: Vec<(&'static str, Value)>) -> Statement {
    InsertBuilder::new(table, row)
        .mode(StatementMode::Literal)
        .build()
}

/// Literal UPDATE for a row; blobs are the only parameters.
#[must_use]
pub fn update_sql(table: &TableObject, row: Vec<(&'static str, Value)>, id: i64) -> Option<Statement> {
    UpdateBuilder::new(table, row, id)
        .mode(StatementMode::Literal)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shillelagh_core::{SemanticType, TableColumn, TableId, TypeMapper};

    fn primitive_table() -> TableObject {
        let column = |name: &str, semantic| TableColumn::new(name, TypeMapper::map(semantic), false);
        TableObject::new(
            TableId(0),
            "tests::TestPrimitiveTable",
            "TestPrimitiveTable",
            "id",
            vec![
                column("aShort", SemanticType::Int16),
                column("anInt", SemanticType::Int32),
                column("aLong", SemanticType::Int64),
                column("aFloat", SemanticType::Float32),
                column("aDouble", SemanticType::Float64),
                column("aBoolean", SemanticType::Boolean),
            ],
            Vec::new(),
        )
    }

    fn primitive_row() -> Vec<(&'static str, Value)> {
        vec![
            ("aShort", Value::SmallInt(234)),
            ("anInt", Value::Int(23)),
            ("aLong", Value::BigInt(10000)),
            ("aFloat", Value::Float(4.0)),
            ("aDouble", Value::Double(2_342_342.232_3)),
            ("aBoolean", Value::Bool(true)),
        ]
    }

    fn text_table() -> TableObject {
        TableObject::new(
            TableId(1),
            "tests::TestBlobs",
            "TestBlobs",
            "id",
            vec![
                TableColumn::new("aString", TypeMapper::map(SemanticType::Text), false),
                TableColumn::new("aDate", TypeMapper::map(SemanticType::Date), false),
                TableColumn::new("aBlob", TypeMapper::map(SemanticType::Bytes), true),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_insert_literal() {
        let stmt = insert_sql(&primitive_table(), primitive_row());
        assert_eq!(
            stmt.sql,
            "INSERT INTO TestPrimitiveTable (aShort, anInt, aLong, aFloat, aDouble, aBoolean) \
             VALUES (234, 23, 10000, 4, 2342342.2323, 1)"
        );
        assert!(stmt.is_literal());
    }

    #[test]
    fn test_insert_bound() {
        let stmt = InsertBuilder::new(&primitive_table(), primitive_row()).build();
        assert_eq!(
            stmt.sql,
            "INSERT INTO TestPrimitiveTable (aShort, anInt, aLong, aFloat, aDouble, aBoolean) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
        assert_eq!(stmt.params, primitive_row().into_iter().map(|(_, v)| v).collect::<Vec<_>>());
    }

    #[test]
    fn test_insert_follows_table_order_not_row_order() {
        let mut row = primitive_row();
        row.reverse();
        let stmt = insert_sql(&primitive_table(), row);
        assert!(stmt.sql.ends_with("VALUES (234, 23, 10000, 4, 2342342.2323, 1)"));
    }

    #[test]
    fn test_missing_column_is_null() {
        let stmt = insert_sql(&text_table(), vec![("aString", Value::from("x"))]);
        assert_eq!(
            stmt.sql,
            "INSERT INTO TestBlobs (aString, aDate, aBlob) VALUES ('x', NULL, NULL)"
        );
    }

    #[test]
    fn test_blob_is_bound_in_literal_mode() {
        let row = vec![
            ("aString", Value::from("test string")),
            ("aDate", Value::Timestamp(1_400_000_000_123)),
            ("aBlob", Value::Bytes(vec![1, 2, 3])),
        ];
        let stmt = insert_sql(&text_table(), row);
        assert_eq!(
            stmt.sql,
            "INSERT INTO TestBlobs (aString, aDate, aBlob) VALUES ('test string', 1400000000123, ?1)"
        );
        assert_eq!(stmt.params, vec![Value::Bytes(vec![1, 2, 3])]);
    }

    #[test]
    fn test_literal_and_bound_agree_on_columns() {
        let literal = insert_sql(&primitive_table(), primitive_row());
        let bound = InsertBuilder::new(&primitive_table(), primitive_row()).build();
        let columns = |sql: &str| sql.split(" VALUES ").next().map(str::to_string);
        assert_eq!(columns(&literal.sql), columns(&bound.sql));
    }

    #[test]
    fn test_insert_default_values() {
        let table = TableObject::new(TableId(2), "tests::Empty", "Empty", "id", Vec::new(), Vec::new());
        let stmt = InsertBuilder::new(&table, Vec::new()).build();
        assert_eq!(stmt.sql, "INSERT INTO Empty DEFAULT VALUES");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_update_literal() {
        let stmt = update_sql(&primitive_table(), primitive_row(), 7).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE TestPrimitiveTable SET aShort = 234, anInt = 23, aLong = 10000, aFloat = 4, \
             aDouble = 2342342.2323, aBoolean = 1 WHERE id = 7"
        );
    }

    #[test]
    fn test_update_bound_binds_id_last() {
        let stmt = UpdateBuilder::new(&text_table(), vec![("aString", Value::from("y"))], 3)
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE TestBlobs SET aString = ?1, aDate = ?2, aBlob = ?3 WHERE id = ?4"
        );
        assert_eq!(stmt.params.last(), Some(&Value::BigInt(3)));
    }

    #[test]
    fn test_update_without_columns() {
        let table = TableObject::new(TableId(2), "tests::Empty", "Empty", "id", Vec::new(), Vec::new());
        assert!(UpdateBuilder::new(&table, Vec::new(), 1).build().is_none());
    }
}
