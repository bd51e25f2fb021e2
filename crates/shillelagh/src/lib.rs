//! Shillelagh: annotated Rust types to SQLite tables.
//!
//! `shillelagh` is the **user-facing facade** of the workspace. It re-exports the
//! derive macro, the core types and the `Shillelagh` ORM facade so applications
//! depend on one crate.
//!
//! # Role In The Architecture
//!
//! - **Annotation surface**: `#[derive(Model)]` with `#[shillelagh(...)]` attributes.
//! - **Operations**: `Shillelagh::create_table`, `drop_table`, `insert`, `update`,
//!   `get_table_name`.
//! - **Storage**: any `Connection`; enable the `sqlite` feature for the bundled
//!   SQLite driver.
//!
//! # Example
//!
//! ```ignore
//! use shillelagh::prelude::*;
//!
//! #[derive(Model, Debug, Default)]
//! #[shillelagh(table)]
//! struct Book {
//!     #[shillelagh(id)]
//!     id: Option<i64>,
//!     title: String,
//!     #[shillelagh(foreign_key)]
//!     author_id: Option<i64>,
//! }
//!
//! #[derive(Model, Debug, Default)]
//! #[shillelagh(table)]
//! struct Author {
//!     #[shillelagh(id)]
//!     id: Option<i64>,
//!     name: String,
//!     #[shillelagh(one_to_many, foreign_key = "author_id")]
//!     books: Vec<Book>,
//! }
//!
//! let orm = Shillelagh::new(SqliteConnection::open_memory()?);
//! orm.create_table::<Author>()?;
//! orm.create_table::<Book>()?;
//! orm.insert(&mut author)?;
//! ```

pub use shillelagh_core::{
    Connection, Error, FieldInfo, FieldKind, Model, ModelInfo, Related, RelationshipDescriptor,
    RelationshipKind, Result, Row, SemanticType, StorageType, TableColumn, TableObject,
    TableRegistry, TypeMapper, Value, decode_object, encode_object, last_insert_rowid_sql,
};
pub use shillelagh_macros::Model;
pub use shillelagh_query::{
    InsertBuilder, Statement, StatementMode, UpdateBuilder, insert_sql, update_sql,
};
pub use shillelagh_schema::{create_table_sql, drop_table_sql};
pub use shillelagh_session::{Shillelagh, ShillelaghConfig};

#[cfg(feature = "sqlite")]
pub use shillelagh_sqlite::SqliteConnection;

/// Error types, for matching on failure details.
pub mod error {
    pub use shillelagh_core::error::*;
}

/// Everything needed to declare and persist models.
pub mod prelude {
    pub use crate::{
        Connection, Error, Model, Result, Shillelagh, ShillelaghConfig, StatementMode, Value,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::SqliteConnection;
}
