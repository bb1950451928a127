//! The `Executor` trait: unifies a direct connection, a pooled handle, and a
//! transaction behind one interface (spec's "Scope"), generalizing the
//! teacher's `GenericClient` from a single Postgres-shaped trait to one that
//! speaks `?`-placeholder SQL and [`Value`] across every backend.
//!
//! Built with `#[async_trait]` (already part of the dependency stack) rather
//! than native async-fn-in-trait so `Arc<dyn Executor>` stays usable — the
//! registry (§4.7) and transaction helper (§4.6) both need to hold a handle
//! without knowing its concrete backend type.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::row::Row;
use crate::value::Value;
use async_trait::async_trait;

/// Anything that can run dialect-neutral SQL: a `Db` handle, a pooled
/// connection, or an open [`crate::transaction::Transaction`].
///
/// Every method takes SQL with `?` placeholders; implementors rewrite them
/// to their native form via [`Executor::dialect`] before sending to the
/// driver. `tag`-suffixed methods thread a query name through to the
/// monitor hooks without changing execution semantics.
#[async_trait]
pub trait Executor: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<Row>>;

    async fn query_one(&self, sql: &str, args: &[Value]) -> DbResult<Row> {
        let rows = self.query(sql, args).await?;
        rows.into_iter().next().ok_or_else(|| DbError::not_found("expected one row, got none"))
    }

    async fn query_opt(&self, sql: &str, args: &[Value]) -> DbResult<Option<Row>> {
        let rows = self.query(sql, args).await?;
        Ok(rows.into_iter().next())
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64>;

    async fn query_tagged(&self, _tag: &str, sql: &str, args: &[Value]) -> DbResult<Vec<Row>> {
        self.query(sql, args).await
    }

    async fn query_one_tagged(&self, _tag: &str, sql: &str, args: &[Value]) -> DbResult<Row> {
        self.query_one(sql, args).await
    }

    async fn query_opt_tagged(&self, _tag: &str, sql: &str, args: &[Value]) -> DbResult<Option<Row>> {
        self.query_opt(sql, args).await
    }

    async fn execute_tagged(&self, _tag: &str, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.execute(sql, args).await
    }

    /// True when this scope is an open transaction (nested `transaction()`
    /// calls on such a scope are rejected, §4.6).
    fn in_transaction(&self) -> bool {
        false
    }
}
