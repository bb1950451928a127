//! `INSERT` builder (spec §4.2/§3 "Insertion order of Record columns
//! determines positional order of the generated INSERT's column list and
//! values").

use super::traits::{MutationBuilder, SqlBuilder};
use crate::client::Executor;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::record::Record;
use crate::sql::Sql;
use crate::value::Value;

/// Builds and executes a single-row `INSERT` from a [`Record`].
///
/// Column order follows the `Record`'s insertion order, not an internal
/// sort, so the generated column list and `VALUES` tuple stay in the same
/// order the caller built the record in.
pub struct InsertBuilder {
    table: String,
    record: Record,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>, record: Record) -> Self {
        Self { table: table.into(), record }
    }

    fn compose(&self, dialect: &dyn Dialect, pk_column: Option<&str>) -> DbResult<Sql> {
        if self.record.is_empty() {
            return Err(DbError::invalid_argument("InsertBuilder: record has no columns to insert"));
        }
        let columns: Vec<&str> = self.record.columns().collect();
        let mut q = Sql::new(format!("INSERT INTO {} ({}) VALUES (", self.table, columns.join(", ")));
        let mut first = true;
        for col in &columns {
            if !first {
                q.push(", ");
            }
            first = false;
            let value = self.record.get(col).cloned().unwrap_or(Value::Null);
            q.push_bind(value);
        }
        q.push(")");
        if let Some(pk) = pk_column {
            if let Some(clause) = dialect.returning_clause(pk) {
                q.push(" ").push(&clause);
            }
        }
        Ok(q)
    }

    /// Execute the insert, returning the number of affected rows (always 1
    /// on success for a single-row insert).
    pub async fn execute(&self, conn: &impl Executor) -> DbResult<u64> {
        let q = self.compose(conn.dialect(), None)?;
        q.execute(conn).await
    }

    /// Execute the insert and return the newly generated primary key.
    ///
    /// Dialects that support `RETURNING` (Postgres, SQLite 3.35+) append it
    /// to the same statement; others run [`Dialect::last_insert_id_statement`]
    /// as a follow-up query against the same scope (so it sees the same
    /// transaction/session the insert ran in).
    pub async fn execute_returning_id(&self, conn: &impl Executor, pk_column: &str) -> DbResult<i64> {
        let dialect = conn.dialect();
        if dialect.returning_clause(pk_column).is_some() {
            let q = self.compose(dialect, Some(pk_column))?;
            return q.fetch_scalar_one(conn).await;
        }

        let q = self.compose(dialect, None)?;
        q.execute(conn).await?;

        let Some(stmt) = dialect.last_insert_id_statement(&self.table, pk_column) else {
            return Err(DbError::dialect_unsupported(dialect.kind().name(), "last_insert_id"));
        };
        let follow_up = Sql::new(stmt);
        follow_up.fetch_scalar_one(conn).await
    }
}

impl SqlBuilder for InsertBuilder {
    fn build_sql(&self) -> String {
        if self.record.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", self.table);
        }
        let columns: Vec<&str> = self.record.columns().collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!("INSERT INTO {} ({}) VALUES ({})", self.table, columns.join(", "), placeholders)
    }

    fn validate(&self) -> DbResult<()> {
        if self.record.is_empty() {
            return Err(DbError::invalid_argument("InsertBuilder: record has no columns to insert"));
        }
        Ok(())
    }
}

impl MutationBuilder for InsertBuilder {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    fn record() -> Record {
        let mut r = Record::new();
        r.set("name", "Alice").set("age", 25i64);
        r
    }

    #[test]
    fn composes_columns_in_insertion_order() {
        let ib = InsertBuilder::new("users", record());
        let q = ib.compose(&PostgresDialect, None).unwrap();
        assert_eq!(q.to_sql(), "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn appends_returning_when_dialect_supports_it() {
        let ib = InsertBuilder::new("users", record());
        let q = ib.compose(&PostgresDialect, Some("id")).unwrap();
        assert!(q.to_sql().ends_with("RETURNING id"));
    }

    #[test]
    fn mysql_has_no_returning_clause() {
        let ib = InsertBuilder::new("users", record());
        let q = ib.compose(&MySqlDialect, Some("id")).unwrap();
        assert!(!q.to_sql().contains("RETURNING"));
    }

    #[test]
    fn empty_record_is_rejected() {
        let ib = InsertBuilder::new("users", Record::new());
        assert!(ib.compose(&PostgresDialect, None).is_err());
    }
}
