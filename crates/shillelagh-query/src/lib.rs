//! INSERT and UPDATE statements for Shillelagh.
//!
//! `shillelagh-query` renders model rows into DML text plus bound parameters.
//!
//! # Role In The Architecture
//!
//! - **DML layer**: `InsertBuilder` and `UpdateBuilder` take a `TableObject` and a
//!   row of column values and produce a [`Statement`]. No I/O.
//! - **Used by** `shillelagh-session`, which executes the statements and walks
//!   relationship graphs.

pub mod builder;

pub use builder::{InsertBuilder, Statement, StatementMode, UpdateBuilder, insert_sql, update_sql};
