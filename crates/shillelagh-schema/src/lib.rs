//! Table DDL for Shillelagh.
//!
//! `shillelagh-schema` turns a `TableObject` into the statements that create and
//! drop its table.
//!
//! # Role In The Architecture
//!
//! - **DDL layer**: pure string generation, no I/O.
//! - **Used by** `shillelagh-session`, which executes the statements through a
//!   `Connection` for `create_table` / `drop_table`.

pub mod ddl;

pub use ddl::{create_table_sql, drop_table_sql};
