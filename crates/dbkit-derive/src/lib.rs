//! Derive macros for `dbkit`.
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_row;
mod model;

/// Derive `dbkit::FromRow` for a struct.
///
/// # Example
///
/// ```ignore
/// use dbkit::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[dbkit(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[dbkit(column = "name")]` — map a field to a different column name.
#[proc_macro_derive(FromRow, attributes(dbkit))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input).unwrap_or_else(|e| e.to_compile_error()).into()
}

/// Derive `Model` metadata for a struct: a table name, per-field column
/// constants, a `SELECT_LIST`, and an implementation of `dbkit::ModelMeta`.
///
/// # Example
///
/// ```ignore
/// use dbkit::Model;
///
/// #[derive(Model)]
/// #[dbkit(table = "users")]
/// struct User {
///     #[dbkit(id)]
///     user_id: i64,
///     username: String,
///     email: Option<String>,
/// }
/// ```
///
/// # Generated
///
/// - `TABLE: &'static str`
/// - `ID: &'static str` (only if a field carries `#[dbkit(id)]`)
/// - `COL_*: &'static str` per field
/// - `SELECT_LIST: &'static str`
/// - `fn select_list_as(alias: &str) -> String`
/// - `impl dbkit::ModelMeta for Self`
///
/// # Attributes
///
/// Struct-level:
/// - `#[dbkit(table = "name")]` — table name (required).
///
/// Field-level:
/// - `#[dbkit(id)]` — mark the field as the primary key.
/// - `#[dbkit(column = "name")]` — map a field to a different column name.
#[proc_macro_derive(Model, attributes(dbkit))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input).unwrap_or_else(|e| e.to_compile_error()).into()
}
