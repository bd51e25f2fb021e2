//! The `Model` trait: what a persistable type exposes to the engine.
//!
//! Implementations are normally generated by `#[derive(Model)]`. The trait replaces
//! runtime reflection with two pieces of compile-time output:
//!
//! - [`ModelInfo`]: static metadata (table marker, declared fields) from which the
//!   registry derives a `TableObject`.
//! - Instance accessors: column values, id write-back, foreign-key propagation and
//!   mutable access to nested relationship values. These are object safe so the
//!   relationship resolver can walk heterogeneous graphs as `&mut dyn Model`.

use std::any::TypeId;

use crate::error::Result;
use crate::field::FieldInfo;
use crate::value::Value;

/// Static metadata about a model type.
#[derive(Debug, Clone, Copy)]
pub struct ModelInfo {
    /// Fully qualified type name, used in error messages.
    pub type_name: &'static str,
    /// Cache key in the table registry.
    pub type_id: TypeId,
    /// Table name when the type carries the table marker, `None` otherwise.
    pub table: Option<&'static str>,
    /// Declared fields, in declaration order.
    pub fields: &'static [FieldInfo],
}

impl ModelInfo {
    /// Build the metadata for `T`.
    pub fn new<T: ?Sized + 'static>(table: Option<&'static str>, fields: &'static [FieldInfo]) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            table,
            fields,
        }
    }

    /// Whether the type carries the table marker.
    #[must_use]
    pub const fn is_table(&self) -> bool {
        self.table.is_some()
    }

    /// Look up a declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Mutable access to the value(s) behind a relationship field.
pub enum Related<'a> {
    /// The field is unset (`None`) or unknown.
    None,
    /// A one-to-one target.
    One(&'a mut dyn Model),
    /// One-to-many targets, in sequence order.
    Many(Vec<&'a mut dyn Model>),
}

/// Trait for types that can be persisted as a table row.
pub trait Model {
    /// Static metadata for this type.
    fn model_info() -> ModelInfo
    where
        Self: Sized;

    /// Engine-only constructor reserved for materializing rows.
    fn orm_only() -> Self
    where
        Self: Sized;

    /// Metadata of the concrete type behind a `dyn Model`.
    fn info(&self) -> ModelInfo;

    /// The generated id, if the instance has one.
    fn row_id(&self) -> Option<i64>;

    /// Write a generated id back into the id field.
    fn set_row_id(&mut self, id: i64);

    /// Put back an id observed before an insert that was rolled back.
    fn reset_row_id(&mut self, previous: Option<i64>);

    /// Column values keyed by column name, excluding the id.
    ///
    /// One-to-one fields contribute the target's current id; one-to-many fields
    /// contribute nothing.
    fn to_row(&self) -> Result<Vec<(&'static str, Value)>>;

    /// Store a one-to-many parent id in the field backing `column`.
    ///
    /// Returns the value the field held before, or `None` if the type has no such
    /// foreign-key field.
    fn replace_foreign_key(&mut self, _column: &str, _id: Option<i64>) -> Option<Option<i64>> {
        None
    }

    /// Mutable access to the relationship field named `field`.
    fn related_mut(&mut self, _field: &str) -> Related<'_> {
        Related::None
    }
}

/// Field types that can hold a generated row id.
pub trait RowId {
    fn row_id(&self) -> Option<i64>;
    fn set_row_id(&mut self, id: i64);
    /// Overwrite with an earlier `row_id()` value.
    fn reset_row_id(&mut self, previous: Option<i64>);
}

impl RowId for i64 {
    fn row_id(&self) -> Option<i64> {
        Some(*self)
    }

    fn set_row_id(&mut self, id: i64) {
        *self = id;
    }

    fn reset_row_id(&mut self, previous: Option<i64>) {
        *self = previous.unwrap_or_default();
    }
}

impl RowId for Option<i64> {
    fn row_id(&self) -> Option<i64> {
        *self
    }

    fn set_row_id(&mut self, id: i64) {
        *self = Some(id);
    }

    fn reset_row_id(&mut self, previous: Option<i64>) {
        *self = previous;
    }
}
