//! `DELETE` builder (spec §4.2). Soft-delete rewriting into an `UPDATE`
//! (tombstone column) and the `Restore`/`ForceDelete` operations are applied
//! one layer up, by the feature interceptor (spec §4.4) — this builder only
//! ever emits a real `DELETE`.

use super::traits::{MutationBuilder, SqlBuilder};
use crate::client::Executor;
use crate::condition::Condition;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::sql::Sql;
use crate::value::Value;

/// Builds and executes a `DELETE` against one table.
pub struct DeleteBuilder {
    table: String,
    where_cond: Option<Condition>,
    allow_delete_all: bool,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), where_cond: None, allow_delete_all: false }
    }

    /// Permit a `DELETE` with no `WHERE` clause. Without this, an empty
    /// condition composes to a safe `WHERE 1=0` no-op rather than deleting
    /// the whole table.
    pub fn allow_delete_all(&mut self, allow: bool) -> &mut Self {
        self.allow_delete_all = allow;
        self
    }

    pub fn and(&mut self, cond: Condition) -> &mut Self {
        self.where_cond = Some(match self.where_cond.take() {
            Some(existing) => existing.and(cond),
            None => cond,
        });
        self
    }

    pub fn and_eq(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::eq(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_raw(&mut self, sql: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.and(Condition::raw(sql, args))
    }

    fn compose(&self, dialect: &dyn Dialect) -> DbResult<Sql> {
        if self.where_cond.is_none() && !self.allow_delete_all {
            return Ok(Sql::new(format!("DELETE FROM {} WHERE 1=0", self.table)));
        }
        let mut q = Sql::new(format!("DELETE FROM {}", self.table));
        q.push_where(self.where_cond.as_ref(), dialect)?;
        Ok(q)
    }

    pub async fn execute(&self, conn: &impl Executor) -> DbResult<u64> {
        let q = self.compose(conn.dialect())?;
        q.execute(conn).await
    }

    /// Table name this builder targets. Used by the soft-delete interceptor
    /// to build an equivalent `UpdateBuilder` over the same table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// The accumulated `WHERE` condition, consumed. Used by the soft-delete
    /// interceptor to carry the same predicate over to a tombstone `UPDATE`.
    pub fn into_where(self) -> Option<Condition> {
        self.where_cond
    }
}

impl SqlBuilder for DeleteBuilder {
    fn build_sql(&self) -> String {
        self.compose(&crate::dialect::PostgresDialect)
            .map(|q| q.to_sql())
            .unwrap_or_else(|e| format!("<invalid DeleteBuilder: {e}>"))
    }

    fn validate(&self) -> DbResult<()> {
        if self.where_cond.is_none() && !self.allow_delete_all {
            return Err(DbError::invalid_argument(
                "DeleteBuilder: refusing to delete without a WHERE clause (call allow_delete_all(true) to override)",
            ));
        }
        Ok(())
    }
}

impl MutationBuilder for DeleteBuilder {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresDialect;

    #[test]
    fn composes_delete_with_where() {
        let mut db = DeleteBuilder::new("users");
        db.and_eq("id", 1i64).unwrap();
        let q = db.compose(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "DELETE FROM users WHERE id = ?");
    }

    #[test]
    fn without_where_defaults_to_safe_noop() {
        let db = DeleteBuilder::new("users");
        let q = db.compose(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "DELETE FROM users WHERE 1=0");
        assert!(db.validate().is_err());
    }

    #[test]
    fn allow_delete_all_permits_unconditional_delete() {
        let mut db = DeleteBuilder::new("users");
        db.allow_delete_all(true);
        let q = db.compose(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "DELETE FROM users");
        assert!(db.validate().is_ok());
    }
}
