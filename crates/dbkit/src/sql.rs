//! SQL-first dynamic builder.
//!
//! Complements the table builders in [`crate::builder`]:
//! - the table builders are great for typed `SELECT`/`INSERT`/`UPDATE`/`DELETE`.
//! - `Sql` is for composing arbitrary SQL dynamically without manually
//!   tracking placeholder positions.
//!
//! `Sql` always speaks the crate's idealized `?`-placeholder dialect;
//! [`crate::client::Executor`] implementations rewrite placeholders to their
//! native form right before sending SQL to the driver, so a `Sql` value is
//! portable across every backend.
//!
//! # Example
//!
//! ```ignore
//! use dbkit::sql;
//!
//! let mut q = sql("SELECT id, username FROM users WHERE 1=1");
//! if let Some(status) = status {
//!     q.push(" AND status = ").push_bind(status);
//! }
//! q.push(" ORDER BY created_at DESC");
//!
//! let users: Vec<User> = q.fetch_all_as(&db).await?;
//! ```

use crate::client::Executor;
use crate::condition::Condition;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::ident::IntoIdent;
use crate::row::{FromRow, FromValue, Row};
use crate::value::Value;

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A SQL-first, parameter-safe dynamic SQL builder.
///
/// Stores SQL text and bound values separately; `?` placeholders are
/// generated positionally as parts are appended.
#[derive(Debug, Default)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Value>,
}

/// Start building a SQL statement from an initial fragment.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if s.starts_with('(') {
            s = &s[1..];
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}

/// Read the first column of a row regardless of its name, for scalar fetches
/// where the caller may not know (or care about) the projected column alias.
fn first_column<T: FromValue>(row: &Row) -> DbResult<T> {
    let (column, value) = row
        .record()
        .iter()
        .next()
        .ok_or_else(|| DbError::decode("0", "row has no columns"))?;
    T::from_value(column, value)
}

impl Sql {
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self { parts: vec![SqlPart::Raw(initial_sql.into())], params: Vec::new() }
    }

    pub fn empty() -> Self {
        Self { parts: Vec::new(), params: Vec::new() }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a `?` placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    pub(crate) fn push_bind_value(&mut self, value: Value) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value);
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// If `values` is empty, this appends `NULL` (so `IN (NULL)` stays valid SQL).
    pub fn push_bind_list(&mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };
        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append another `Sql` fragment, consuming it.
    pub fn push_sql(&mut self, mut other: Sql) -> &mut Self {
        self.parts.append(&mut other.parts);
        self.params.append(&mut other.params);
        self
    }

    /// Append a SQL identifier (schema/table/column) safely. Identifiers are
    /// never parameterized; instead they are parsed and validated through
    /// [`crate::Ident`].
    pub fn push_ident(&mut self, ident: impl IntoIdent) -> DbResult<&mut Self> {
        let ident = ident.into_ident()?;
        Ok(self.push(&ident.to_sql()))
    }

    /// Render the idealized SQL with `?` placeholders (not yet dialect-rewritten).
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => out.push('?'),
            }
        }
        out
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    fn validate(&self) -> DbResult<()> {
        let placeholder_count = self.parts.iter().filter(|p| matches!(p, SqlPart::Param)).count();
        if placeholder_count != self.params.len() {
            return Err(DbError::invalid_argument(format!(
                "Sql: placeholders({placeholder_count}) != params({})",
                self.params.len()
            )));
        }
        Ok(())
    }

    /// Append a [`Condition`] tree, keeping this builder's placeholder
    /// positions in sync.
    pub fn push_condition(&mut self, condition: &Condition, dialect: &dyn Dialect) -> DbResult<&mut Self> {
        let mut frag = String::new();
        let mut args = Vec::new();
        condition.compile(dialect, true, &mut frag, &mut args)?;
        self.push(&frag);
        for a in args {
            self.push_bind_value(a);
        }
        Ok(self)
    }

    /// Append a `WHERE ...` clause for `condition`. No-op if `condition` is `None`.
    pub fn push_where(&mut self, condition: Option<&Condition>, dialect: &dyn Dialect) -> DbResult<&mut Self> {
        let Some(condition) = condition else {
            return Ok(self);
        };
        self.push(" WHERE ");
        self.push_condition(condition, dialect)
    }

    // ==================== Execution ====================

    pub async fn fetch_all(&self, conn: &impl Executor) -> DbResult<Vec<Row>> {
        self.validate()?;
        conn.query(&self.to_sql(), &self.params).await
    }

    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl Executor) -> DbResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    pub async fn fetch_one(&self, conn: &impl Executor) -> DbResult<Row> {
        self.validate()?;
        conn.query_one(&self.to_sql(), &self.params).await
    }

    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl Executor) -> DbResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    pub async fn fetch_opt(&self, conn: &impl Executor) -> DbResult<Option<Row>> {
        self.validate()?;
        conn.query_opt(&self.to_sql(), &self.params).await
    }

    pub async fn fetch_opt_as<T: FromRow>(&self, conn: &impl Executor) -> DbResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    pub async fn execute(&self, conn: &impl Executor) -> DbResult<u64> {
        self.validate()?;
        conn.execute(&self.to_sql(), &self.params).await
    }

    // ==================== Tagged execution ====================

    pub async fn fetch_all_tagged(&self, conn: &impl Executor, tag: &str) -> DbResult<Vec<Row>> {
        self.validate()?;
        conn.query_tagged(tag, &self.to_sql(), &self.params).await
    }

    pub async fn fetch_all_tagged_as<T: FromRow>(&self, conn: &impl Executor, tag: &str) -> DbResult<Vec<T>> {
        let rows = self.fetch_all_tagged(conn, tag).await?;
        rows.iter().map(T::from_row).collect()
    }

    pub async fn execute_tagged(&self, conn: &impl Executor, tag: &str) -> DbResult<u64> {
        self.validate()?;
        conn.execute_tagged(tag, &self.to_sql(), &self.params).await
    }

    // ==================== Convenience APIs ====================

    /// Fetch a single-column, single-row result. Relies on the backend
    /// exposing the first projected column under its literal name (plain
    /// alias or bare expression text) in `Row`.
    pub async fn fetch_scalar_one<T: FromValue>(&self, conn: &impl Executor) -> DbResult<T> {
        let row = self.fetch_one(conn).await?;
        first_column(&row)
    }

    pub async fn fetch_scalar_opt<T: FromValue>(&self, conn: &impl Executor) -> DbResult<Option<T>> {
        match self.fetch_opt(conn).await? {
            Some(row) => first_column(&row).map(Some),
            None => Ok(None),
        }
    }

    pub async fn fetch_scalar_all<T: FromValue>(&self, conn: &impl Executor) -> DbResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(first_column).collect()
    }

    /// Wrap this query in `SELECT EXISTS(...)` for an efficient existence check.
    /// Only valid for `SELECT`/`WITH ... SELECT` statements.
    pub async fn exists(&self, conn: &impl Executor) -> DbResult<bool> {
        self.validate()?;
        let inner_sql = self.to_sql();
        let inner_sql = inner_sql.trim_end();
        let inner_sql = inner_sql.strip_suffix(';').unwrap_or(inner_sql).trim_end();

        let trimmed = strip_sql_prefix(inner_sql);
        if !starts_with_keyword(trimmed, "SELECT") && !starts_with_keyword(trimmed, "WITH") {
            return Err(DbError::invalid_argument(
                "exists() only works with SELECT statements (including WITH ... SELECT)",
            ));
        }

        let wrapped_sql = format!("SELECT EXISTS({inner_sql})");
        let row = conn.query_one(&wrapped_sql, &self.params).await?;
        first_column(&row)
    }

    /// Append `LIMIT ? OFFSET ?` (Postgres/MySQL/SQLite native form). Builders
    /// targeting SQL Server/Oracle should use [`crate::dialect::Dialect::paginate`]
    /// instead of this convenience method.
    pub fn limit_offset(&mut self, limit: i64, offset: i64) -> &mut Self {
        self.push(" LIMIT ").push_bind(limit).push(" OFFSET ").push_bind(offset)
    }

    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.push(" LIMIT ").push_bind(n)
    }

    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.push(" OFFSET ").push_bind(n)
    }

    /// Page-based pagination (page numbers start at 1).
    pub fn page(&mut self, page: i64, per_page: i64) -> DbResult<&mut Self> {
        if page < 1 {
            return Err(DbError::invalid_argument(format!("page must be >= 1, got {page}")));
        }
        if per_page < 1 {
            return Err(DbError::invalid_argument(format!("per_page must be >= 1, got {per_page}")));
        }
        let offset = (page - 1) * per_page;
        Ok(self.limit_offset(per_page, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_placeholders_in_order() {
        let mut q = sql("SELECT * FROM users WHERE a = ");
        q.push_bind(1i64).push(" AND b = ").push_bind("x");
        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE a = ? AND b = ?");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn can_compose_fragments() {
        let mut w = Sql::empty();
        w.push(" WHERE id = ").push_bind(42i64);
        let mut q = sql("SELECT * FROM users");
        q.push_sql(w);
        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id = ?");
        assert_eq!(q.params().len(), 1);
    }

    #[test]
    fn bind_list_renders_commas() {
        let mut q = sql("SELECT * FROM users WHERE id IN (");
        q.push_bind_list(vec![1i64, 2, 3]).push(")");
        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id IN (?, ?, ?)");
        assert_eq!(q.params().len(), 3);
    }

    #[test]
    fn bind_list_empty_is_valid_sql() {
        let mut q = sql("SELECT * FROM users WHERE id IN (");
        q.push_bind_list(Vec::<i64>::new()).push(")");
        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id IN (NULL)");
        assert_eq!(q.params().len(), 0);
    }

    #[test]
    fn push_ident_accepts_simple_and_dotted() {
        let mut q = Sql::empty();
        q.push_ident("users").unwrap();
        q.push(", ");
        q.push_ident("public.users").unwrap();
        assert_eq!(q.to_sql(), "users, public.users");
    }

    #[test]
    fn push_ident_rejects_unsafe() {
        let mut q = Sql::empty();
        assert!(q.push_ident("users; drop table users; --").is_err());
        assert!(q.push_ident("1users").is_err());
    }

    #[test]
    fn limit_offset_binds_both() {
        let mut q = sql("SELECT * FROM users ORDER BY id");
        q.limit_offset(10, 20);
        assert_eq!(q.to_sql(), "SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn page_converts_to_limit_offset() {
        let mut q = sql("SELECT * FROM users ORDER BY id");
        q.page(3, 25).unwrap();
        assert_eq!(q.to_sql(), "SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn page_rejects_zero() {
        let mut q = sql("SELECT * FROM users ORDER BY id");
        assert!(q.page(0, 25).is_err());
    }
}
