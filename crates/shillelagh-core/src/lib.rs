//! Core types and traits for Shillelagh.
//!
//! `shillelagh-core` is the **foundation layer** of the workspace. It defines the
//! contracts every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Model` is implemented by persistable types (normally through
//!   `#[derive(Model)]`), `Connection` by storage engines.
//! - **Schema model**: `TableObject`, `TableColumn` and `RelationshipDescriptor` describe
//!   the table derived from a model; `TableRegistry` builds and caches them.
//! - **Data model**: `Value` and `Row` carry column values in and out of the storage
//!   engine; `TypeMapper` decides which storage class a field lands in.
//!
//! # Who Uses This Crate
//!
//! - `shillelagh-macros` generates `Model` implementations defined here.
//! - `shillelagh-schema` and `shillelagh-query` turn a `TableObject` into SQL text.
//! - `shillelagh-session` walks relationship graphs through `Model` and drives a
//!   `Connection`.
//! - `shillelagh-sqlite` implements `Connection` on top of SQLite.

pub mod connection;
pub mod error;
pub mod field;
pub mod identifiers;
pub mod model;
pub mod registry;
pub mod relationship;
pub mod row;
pub mod table;
pub mod types;
pub mod value;

pub use connection::{Connection, last_insert_rowid_sql};
pub use error::{
    ConnectionError, Error, Operation, QueryError, QueryErrorKind, Result, SchemaError,
    SchemaErrorKind, SerializationError, UnregisteredTableError,
};
pub use field::{FieldInfo, FieldKind};
pub use identifiers::{is_valid_identifier, validate_identifier};
pub use model::{Model, ModelInfo, Related, RowId};
pub use registry::TableRegistry;
pub use relationship::{OwnerSide, RelationshipDescriptor, RelationshipKind};
pub use row::Row;
pub use table::{TableColumn, TableId, TableObject};
pub use types::{SemanticType, StorageType, TypeMapper, TypeMapping};
pub use value::{DateMillis, ToValue, Value, decode_object, encode_object};
