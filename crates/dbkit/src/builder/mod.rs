//! Table builders: `SELECT`/`INSERT`/`UPDATE`/`DELETE` over one table,
//! speaking the crate's dialect-neutral `?`-placeholder SQL and executing
//! through `crate::client::Executor`.
//!
//! - Safe defaults: `DeleteBuilder` requires a `WHERE` clause (unless
//!   explicitly allowed); `UpdateBuilder`/`InsertBuilder` require a non-empty
//!   `SET`/column list.
//! - Placeholders are tracked by [`crate::sql::Sql`], not by hand.

pub mod delete;
pub mod insert;
pub mod select;
pub mod table;
pub mod traits;
pub mod update;

pub use delete::DeleteBuilder;
pub use insert::InsertBuilder;
pub use select::QueryBuilder;
pub use table::Table;
pub use traits::{MutationBuilder, SqlBuilder};
pub use update::UpdateBuilder;
