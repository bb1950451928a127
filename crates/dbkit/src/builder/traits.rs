//! Shared debug/validate surface for the table builders.
//!
//! The teacher's `SqlBuilder`/`MutationBuilder` pair ran queries directly
//! against `GenericClient` + `tokio_postgres::types::ToSql`. Terminal
//! execution here goes through [`crate::sql::Sql`] instead (it already owns
//! `?`-placeholder rendering and dialect dispatch), so this trait is now
//! just the common `build_sql`/`validate` surface each builder's `Display`-
//! style debug helpers lean on.

use crate::error::DbResult;

/// Anything that can render itself as idealized `?`-placeholder SQL for
/// debug logging, independent of a live [`crate::client::Executor`].
pub trait SqlBuilder {
    fn build_sql(&self) -> String;

    fn validate(&self) -> DbResult<()> {
        Ok(())
    }
}

/// Marker for INSERT/UPDATE/DELETE builders (as opposed to `QueryBuilder`'s
/// read-only `SELECT`).
pub trait MutationBuilder: SqlBuilder {}
