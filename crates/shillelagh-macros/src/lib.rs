//! Procedural macros for Shillelagh.
//!
//! `shillelagh-macros` is the **compile-time codegen layer**. It turns a plain Rust
//! struct plus `#[shillelagh(...)]` attributes into a `shillelagh_core::Model`
//! implementation, so the engine never needs runtime reflection.
//!
//! # Role In The Architecture
//!
//! - **Metadata**: emits a static `FieldInfo` slice and a `ModelInfo` the table
//!   registry derives the table schema from.
//! - **Instance access**: emits `to_row`, id write-back, foreign-key propagation and
//!   relationship access used by the insert graph walker.
//!
//! # Attributes
//!
//! Struct level:
//! - `table` or `table = "name"`: marks the type persistable.
//! - `orm_only = "path::to::ctor"`: engine-only constructor (default `Default::default`).
//!
//! Field level:
//! - `id`: the generated primary key (`i64` or `Option<i64>`).
//! - `column = "name"`: column name override.
//! - `skip`: not persisted.
//! - `one_to_one`: nested model (`T` or `Option<T>`), stored as the child's id.
//!   Self-referential links use `Box<T>` or `Option<Box<T>>`.
//! - `one_to_many` / `one_to_many, foreign_key = "col"`: `Vec<T>` of children.
//! - `foreign_key`: child-side column holding a one-to-many parent's id.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod model_derive;

/// Derive `shillelagh_core::Model` for a struct.
///
/// # Example
///
/// ```ignore
/// #[derive(Model, Default)]
/// #[shillelagh(table)]
/// struct Author {
///     #[shillelagh(id)]
///     id: Option<i64>,
///     name: String,
///     #[shillelagh(one_to_many)]
///     books: Vec<Book>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(shillelagh))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let def = match model_derive::parse_model(&input) {
        Ok(def) => def,
        Err(e) => return e.to_compile_error().into(),
    };

    model_derive::generate_model_impl(&def).into()
}
