//! Derived table descriptors.

use serde::Serialize;

use crate::relationship::{RelationshipDescriptor, RelationshipKind};
use crate::types::{StorageType, TypeMapping};

/// Index of a table in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableId(pub usize);

/// One persisted scalar column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    pub column_name: String,
    pub storage_type: StorageType,
    pub is_date: bool,
    pub is_nullable: bool,
    /// Serialized object rather than raw bytes.
    pub is_blob_object: bool,
}

impl TableColumn {
    /// Build a column from a type mapping.
    pub fn new(column_name: impl Into<String>, mapping: TypeMapping, is_nullable: bool) -> Self {
        Self {
            column_name: column_name.into(),
            storage_type: mapping.storage_type,
            is_date: mapping.is_date,
            is_nullable,
            is_blob_object: mapping.is_blob_object,
        }
    }

    /// An INTEGER column holding another row's id.
    pub fn foreign_key(column_name: impl Into<String>, is_nullable: bool) -> Self {
        Self {
            column_name: column_name.into(),
            storage_type: StorageType::Integer,
            is_date: false,
            is_nullable,
            is_blob_object: false,
        }
    }
}

/// The schema derived from one persistable model type.
///
/// `columns` excludes the id column; its order drives both the DDL column order and
/// the positional pairing of columns and values in DML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableObject {
    pub(crate) id: TableId,
    pub(crate) type_name: &'static str,
    pub(crate) table_name: String,
    pub(crate) id_column_name: String,
    pub(crate) columns: Vec<TableColumn>,
    pub(crate) relationships: Vec<RelationshipDescriptor>,
}

impl TableObject {
    /// Assemble a descriptor. Normally called by the registry only.
    pub fn new(
        id: TableId,
        type_name: &'static str,
        table_name: impl Into<String>,
        id_column_name: impl Into<String>,
        columns: Vec<TableColumn>,
        relationships: Vec<RelationshipDescriptor>,
    ) -> Self {
        Self {
            id,
            type_name,
            table_name: table_name.into(),
            id_column_name: id_column_name.into(),
            columns,
            relationships,
        }
    }

    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Fully qualified name of the model type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[must_use]
    pub fn id_column_name(&self) -> &str {
        &self.id_column_name
    }

    /// Non-id columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.column_name == name)
    }

    /// Column names as read back by `SELECT *`: id first, then `columns`.
    #[must_use]
    pub fn select_columns(&self) -> Vec<&str> {
        std::iter::once(self.id_column_name.as_str())
            .chain(self.columns.iter().map(|c| c.column_name.as_str()))
            .collect()
    }

    #[must_use]
    pub fn relationships(&self) -> &[RelationshipDescriptor] {
        &self.relationships
    }

    /// Relationships of one kind, in declaration order.
    pub fn relationships_of(&self, kind: RelationshipKind) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SemanticType, TypeMapper};

    fn sample() -> TableObject {
        TableObject::new(
            TableId(0),
            "app::Sample",
            "Sample",
            "id",
            vec![
                TableColumn::new("name", TypeMapper::map(SemanticType::Text), false),
                TableColumn::new("photo", TypeMapper::map(SemanticType::Bytes), true),
                TableColumn::foreign_key("owner", true),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_select_columns_start_with_id() {
        assert_eq!(sample().select_columns(), vec!["id", "name", "photo", "owner"]);
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert_eq!(table.column("owner").unwrap().storage_type, StorageType::Integer);
        assert!(table.column("id").is_none());
        assert_eq!(table.column("photo").unwrap().storage_type, StorageType::Blob);
    }

    #[test]
    fn test_serializes_for_diagnostics() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["table_name"], "Sample");
        assert_eq!(json["columns"][0]["storage_type"], "TEXT");
    }
}
