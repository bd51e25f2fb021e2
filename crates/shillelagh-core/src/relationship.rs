//! Relationship metadata.
//!
//! Relationships are declared on the owning model (via derive attributes) and
//! resolved by the registry into descriptors that point at the target table by
//! arena index, so cyclic schemas never need owning cycles.

use serde::Serialize;

use crate::table::TableId;

/// The type of relationship between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    /// One-to-one: `Order` has one `Invoice`.
    OneToOne,
    /// One-to-many: one `Order` has many `LineItem`s.
    OneToMany,
}

/// Which row carries the foreign-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerSide {
    /// The parent row stores the id of an already-inserted child.
    ParentHoldsChildId,
    /// Each child row stores the id of an already-inserted parent.
    ChildHoldsParentId,
}

impl RelationshipKind {
    /// The owner side implied by this kind.
    #[must_use]
    pub const fn owner_side(&self) -> OwnerSide {
        match self {
            RelationshipKind::OneToOne => OwnerSide::ParentHoldsChildId,
            RelationshipKind::OneToMany => OwnerSide::ChildHoldsParentId,
        }
    }
}

/// A resolved relationship from one table to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipDescriptor {
    /// Relationship field on the owning model.
    pub field_name: &'static str,
    pub kind: RelationshipKind,
    /// Target table in the registry arena.
    pub target: TableId,
    pub target_table: String,
    /// Column holding the foreign key: on the parent for one-to-one, on the child
    /// for one-to-many.
    pub foreign_key_column_name: String,
    pub owner_side: OwnerSide,
}

impl RelationshipDescriptor {
    /// Create a descriptor; the owner side follows from `kind`.
    pub fn new(
        field_name: &'static str,
        kind: RelationshipKind,
        target: TableId,
        target_table: impl Into<String>,
        foreign_key_column_name: impl Into<String>,
    ) -> Self {
        Self {
            field_name,
            kind,
            target,
            target_table: target_table.into(),
            foreign_key_column_name: foreign_key_column_name.into(),
            owner_side: kind.owner_side(),
        }
    }
}
