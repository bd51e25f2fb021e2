//! Field metadata.

use crate::model::ModelInfo;
use crate::types::SemanticType;

/// What a declared field contributes to its table.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// The primary key. Exactly one per table.
    Id,
    /// A persisted scalar column.
    Scalar {
        semantic: SemanticType,
        nullable: bool,
    },
    /// A child-side column that stores the id of a one-to-many parent.
    ForeignKey { nullable: bool },
    /// A nested persistable value. The owner stores the target's id in this
    /// field's column.
    OneToOne {
        target: fn() -> ModelInfo,
        nullable: bool,
    },
    /// An ordered sequence of persistable values. Each target row stores the
    /// owner's id in `foreign_key` (default `<owner table>_id`).
    OneToMany {
        target: fn() -> ModelInfo,
        foreign_key: Option<&'static str>,
    },
}

impl FieldKind {
    /// True for fields that are nested models rather than columns.
    #[must_use]
    pub const fn is_relationship(&self) -> bool {
        matches!(self, FieldKind::OneToOne { .. } | FieldKind::OneToMany { .. })
    }
}

/// Metadata about one declared field of a model.
#[derive(Debug, Clone, Copy)]
pub struct FieldInfo {
    /// Rust field name
    pub name: &'static str,
    /// Database column name (may differ from field name)
    pub column_name: &'static str,
    pub kind: FieldKind,
}

impl FieldInfo {
    /// Create a field whose column is named after the field.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column_name: name,
            kind,
        }
    }

    /// Override the column name.
    #[must_use]
    pub const fn column(mut self, column_name: &'static str) -> Self {
        self.column_name = column_name;
        self
    }

    /// The id field.
    pub const fn id(name: &'static str) -> Self {
        Self::new(name, FieldKind::Id)
    }

    /// A non-nullable scalar field.
    pub const fn scalar(name: &'static str, semantic: SemanticType) -> Self {
        Self::new(
            name,
            FieldKind::Scalar {
                semantic,
                nullable: false,
            },
        )
    }

    /// A nullable scalar field (`Option<T>`).
    pub const fn nullable_scalar(name: &'static str, semantic: SemanticType) -> Self {
        Self::new(
            name,
            FieldKind::Scalar {
                semantic,
                nullable: true,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_defaults_to_field_name() {
        let field = FieldInfo::scalar("aShort", SemanticType::Int16);
        assert_eq!(field.column_name, "aShort");
        assert!(!field.kind.is_relationship());
    }

    #[test]
    fn test_column_override() {
        let field = FieldInfo::id("id").column("_id");
        assert_eq!(field.name, "id");
        assert_eq!(field.column_name, "_id");
        assert!(matches!(field.kind, FieldKind::Id));
    }
}
