//! `UPDATE` builder (spec §4.2, with §4.4's optimistic-lock `SET version =
//! version + 1` rewrite in mind — that rewrite is applied by the feature
//! interceptor via [`UpdateBuilder::set_raw`], not by this builder itself).

use super::traits::{MutationBuilder, SqlBuilder};
use crate::client::Executor;
use crate::condition::Condition;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::record::Record;
use crate::sql::Sql;
use crate::value::Value;

enum SetField {
    Value(Value),
    Raw(String),
}

/// Builds and executes an `UPDATE` against one table.
pub struct UpdateBuilder {
    table: String,
    set_fields: Vec<(String, SetField)>,
    where_cond: Option<Condition>,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), set_fields: Vec::new(), where_cond: None }
    }

    /// Seed SET fields from a `Record`'s columns, in insertion order.
    pub fn from_record(table: impl Into<String>, record: &Record) -> Self {
        let mut b = Self::new(table);
        for (col, value) in record.iter() {
            b.set_fields.push((col.to_string(), SetField::Value(value.clone())));
        }
        b
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.set_fields.push((column.into(), SetField::Value(value.into())));
        self
    }

    /// Set a column to a raw SQL expression (e.g. `version = version + 1`'s
    /// right-hand side). No parameters are bound for this column.
    pub fn set_raw(&mut self, column: impl Into<String>, expr: impl Into<String>) -> &mut Self {
        self.set_fields.push((column.into(), SetField::Raw(expr.into())));
        self
    }

    /// Replace the SET entry for `column` if present, or append it.
    /// Used by the optimistic-lock interceptor to turn a plain `SET version
    /// = ?` into `SET version = version + 1`.
    pub fn replace_set_raw(&mut self, column: &str, expr: impl Into<String>) -> &mut Self {
        if let Some(slot) = self.set_fields.iter_mut().find(|(c, _)| c == column) {
            slot.1 = SetField::Raw(expr.into());
        } else {
            self.set_fields.push((column.to_string(), SetField::Raw(expr.into())));
        }
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

    fn compose(&self, dialect: &dyn Dialect, pk_column: Option<&str>) -> DbResult<Sql> {
        if self.set_fields.is_empty() {
            return Err(DbError::invalid_argument("UpdateBuilder: SET clause cannot be empty"));
        }
        let mut q = Sql::new(format!("UPDATE {} SET ", self.table));
        let mut first = true;
        for (col, field) in &self.set_fields {
            if !first {
                q.push(", ");
            }
            first = false;
            match field {
                SetField::Value(v) => {
                    q.push(col).push(" = ");
                    q.push_bind(v.clone());
                }
                SetField::Raw(expr) => {
                    q.push(col).push(" = ").push(expr);
                }
            }
        }
        q.push_where(self.where_cond.as_ref(), dialect)?;
        if let Some(pk) = pk_column {
            if let Some(clause) = dialect.returning_clause(pk) {
                q.push(" ").push(&clause);
            }
        }
        Ok(q)
    }

    /// Execute the update, returning the affected row count.
    pub async fn execute(&self, conn: &impl Executor) -> DbResult<u64> {
        let q = self.compose(conn.dialect(), None)?;
        q.execute(conn).await
    }
}

impl SqlBuilder for UpdateBuilder {
    /// Idealized `?`-placeholder rendering for debug logging. `Condition`
    /// compilation needs *some* dialect to resolve things like `ILIKE`
    /// fallback, so this picks Postgres arbitrarily — the rendered SQL still
    /// uses `?` placeholders, not Postgres' native `$N` form.
    fn build_sql(&self) -> String {
        if self.set_fields.is_empty() {
            return format!("UPDATE {} SET _error_no_set_fields = 1 WHERE 1=0", self.table);
        }
        self.compose(&crate::dialect::PostgresDialect, None)
            .map(|q| q.to_sql())
            .unwrap_or_else(|e| format!("<invalid UpdateBuilder: {e}>"))
    }

    fn validate(&self) -> DbResult<()> {
        if self.set_fields.is_empty() {
            return Err(DbError::invalid_argument("UpdateBuilder: SET clause cannot be empty"));
        }
        Ok(())
    }
}

impl MutationBuilder for UpdateBuilder {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresDialect;

    #[test]
    fn composes_set_and_where() {
        let mut ub = UpdateBuilder::new("users");
        ub.set("age", 26i64);
        ub.and_eq("id", 1i64).unwrap();
        let q = ub.compose(&PostgresDialect, None).unwrap();
        assert_eq!(q.to_sql(), "UPDATE users SET age = ? WHERE id = ?");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn optimistic_lock_rewrite_replaces_set_and_extends_where() {
        let mut ub = UpdateBuilder::from_record("products", {
            let mut r = Record::new();
            r.set("stock", 95i64).set("version", 1i64);
            &r
        });
        ub.replace_set_raw("version", "version + 1");
        ub.and_eq("id", 1i64).unwrap();
        ub.and_eq("version", 1i64).unwrap();
        let q = ub.compose(&PostgresDialect, None).unwrap();
        assert_eq!(
            q.to_sql(),
            "UPDATE products SET stock = ?, version = version + 1 WHERE id = ? AND version = ?"
        );
    }

    #[test]
    fn empty_set_is_rejected() {
        let ub = UpdateBuilder::new("users");
        assert!(ub.compose(&PostgresDialect, None).is_err());
    }
}
