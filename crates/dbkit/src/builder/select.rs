//! `SELECT` builder (spec §4.2: `Find`, `FindFirst`, `Count`, `Paginate`).

use super::traits::SqlBuilder;
use crate::client::Executor;
use crate::condition::Condition;
use crate::error::{DbError, DbResult};
use crate::feature::FeatureRegistry;
use crate::interceptor::{self, SoftDeleteMode};
use crate::page::Page;
use crate::row::FromRow;
use crate::sql::Sql;
use crate::value::Value;

/// Builds and executes `SELECT` statements against one table.
#[derive(Clone)]
pub struct QueryBuilder {
    table: String,
    select_cols: Vec<String>,
    joins: Vec<String>,
    where_cond: Option<Condition>,
    order_by: Vec<String>,
    group_by: Option<String>,
    having: Option<(String, Vec<Value>)>,
    limit: Option<i64>,
    offset: Option<i64>,
    soft_delete_mode: SoftDeleteMode,
}

impl QueryBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select_cols: vec!["*".to_string()],
            joins: Vec::new(),
            where_cond: None,
            order_by: Vec::new(),
            group_by: None,
            having: None,
            limit: None,
            offset: None,
            soft_delete_mode: SoftDeleteMode::default(),
        }
    }

    /// Include soft-deleted rows alongside live ones (spec's `WithTrashed()`).
    pub fn with_trashed(&mut self) -> &mut Self {
        self.soft_delete_mode = SoftDeleteMode::WithTrashed;
        self
    }

    /// Only soft-deleted rows (spec's `OnlyTrashed()`).
    pub fn only_trashed(&mut self) -> &mut Self {
        self.soft_delete_mode = SoftDeleteMode::OnlyTrashed;
        self
    }

    /// Fold in the soft-delete predicate for `table`, per whatever mode
    /// [`with_trashed`](Self::with_trashed)/[`only_trashed`](Self::only_trashed)
    /// set (default: live rows only). Call once, before the terminal method
    /// (`find`/`count`/`paginate`) — calling it twice ANDs the predicate in
    /// twice, which is harmless but redundant.
    pub fn apply_soft_delete(&mut self, registry: &FeatureRegistry) -> &mut Self {
        if let Some(cond) = interceptor::soft_delete_read_predicate(registry, &self.table, self.soft_delete_mode) {
            self.and(cond);
        }
        self
    }

    pub fn select_cols(&mut self, cols: &[&str]) -> &mut Self {
        self.select_cols = cols.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn add_select(&mut self, col: &str) -> &mut Self {
        if self.select_cols.len() == 1 && self.select_cols[0] == "*" {
            self.select_cols.clear();
        }
        self.select_cols.push(col.to_string());
        self
    }

    pub fn inner_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.joins.push(format!("INNER JOIN {table} ON {on}"));
        self
    }

    pub fn left_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.joins.push(format!("LEFT JOIN {table} ON {on}"));
        self
    }

    pub fn right_join(&mut self, table: &str, on: &str) -> &mut Self {
        self.joins.push(format!("RIGHT JOIN {table} ON {on}"));
        self
    }

    /// Attach another predicate, AND-joined with whatever is already there.
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

    pub fn and_ne(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::ne(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_gt(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::gt(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_gte(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::gte(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_lt(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::lt(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_lte(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::lte(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_like(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::like(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_ilike(&mut self, col: &str, val: impl Into<Value>) -> DbResult<&mut Self> {
        let c = Condition::ilike(col, val)?;
        Ok(self.and(c))
    }

    pub fn and_is_null(&mut self, col: &str) -> DbResult<&mut Self> {
        let c = Condition::is_null(col)?;
        Ok(self.and(c))
    }

    pub fn and_is_not_null(&mut self, col: &str) -> DbResult<&mut Self> {
        let c = Condition::is_not_null(col)?;
        Ok(self.and(c))
    }

    pub fn and_in(&mut self, col: &str, values: Vec<impl Into<Value>>) -> DbResult<&mut Self> {
        let c = Condition::in_list(col, values)?;
        Ok(self.and(c))
    }

    pub fn and_between(
        &mut self,
        col: &str,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> DbResult<&mut Self> {
        let c = Condition::between(col, from, to)?;
        Ok(self.and(c))
    }

    pub fn and_raw(&mut self, sql: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.and(Condition::raw(sql, args))
    }

    pub fn order_by(&mut self, clause: impl Into<String>) -> &mut Self {
        self.order_by.push(clause.into());
        self
    }

    pub fn group_by(&mut self, clause: impl Into<String>) -> &mut Self {
        self.group_by = Some(clause.into());
        self
    }

    pub fn having(&mut self, sql: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.having = Some((sql.into(), args));
        self
    }

    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Page-based shorthand: sets `limit`/`offset` from `(page, per_page)`, 1-indexed.
    pub fn paginate_window(&mut self, page: i64, per_page: i64) -> DbResult<&mut Self> {
        if page < 1 {
            return Err(DbError::invalid_argument(format!("page must be >= 1, got {page}")));
        }
        self.limit = Some(per_page);
        self.offset = Some((page - 1) * per_page);
        Ok(self)
    }

    fn base_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.select_cols.join(", "), self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql
    }

    /// Compose the final statement (without pagination applied). Used directly
    /// by `count()`, and as the "inner" SQL a dialect's `paginate` wraps.
    fn compose(&self, dialect: &dyn crate::dialect::Dialect) -> DbResult<Sql> {
        let mut q = Sql::new(self.base_sql());
        q.push_where(self.where_cond.as_ref(), dialect)?;
        if let Some(group_by) = &self.group_by {
            q.push(" GROUP BY ").push(group_by);
        }
        if let Some((having_sql, having_args)) = &self.having {
            q.push(" HAVING ").push(having_sql);
            for a in having_args {
                q.push_bind_value(a.clone());
            }
        }
        if !self.order_by.is_empty() {
            q.push(" ORDER BY ").push(&self.order_by.join(", "));
        }
        Ok(q)
    }

    /// Final statement with pagination, if `limit`/`offset` were set.
    fn compose_paginated(&self, dialect: &dyn crate::dialect::Dialect) -> DbResult<Sql> {
        let q = self.compose(dialect)?;
        let Some(limit) = self.limit else {
            return Ok(q);
        };
        let offset = self.offset.unwrap_or(0);
        if dialect.requires_order_by_for_pagination() && self.order_by.is_empty() {
            return Err(DbError::invalid_argument(format!(
                "{} pagination requires an ORDER BY clause",
                dialect.kind().name()
            )));
        }
        let wrapped = dialect.paginate(&q.to_sql());
        let mut out = Sql::empty();
        out.push(&wrapped.sql);
        for a in q.params().iter().cloned() {
            out.push_bind_value(a);
        }
        for a in dialect.paginate_args(limit, offset) {
            out.push_bind_value(a);
        }
        Ok(out)
    }

    pub async fn find<T: FromRow>(&self, conn: &impl Executor) -> DbResult<Vec<T>> {
        let q = self.compose_paginated(conn.dialect())?;
        q.fetch_all_as(conn).await
    }

    pub async fn find_rows(&self, conn: &impl Executor) -> DbResult<Vec<crate::row::Row>> {
        let q = self.compose_paginated(conn.dialect())?;
        q.fetch_all(conn).await
    }

    pub async fn find_first<T: FromRow>(&self, conn: &impl Executor) -> DbResult<Option<T>> {
        let mut clone = self.clone();
        clone.limit = Some(1);
        let q = clone.compose_paginated(conn.dialect())?;
        q.fetch_opt_as(conn).await
    }

    pub async fn count(&self, conn: &impl Executor) -> DbResult<i64> {
        let mut count_builder = QueryBuilder::new(self.table.clone());
        count_builder.select_cols = vec!["COUNT(*)".to_string()];
        count_builder.joins = self.joins.clone();
        count_builder.where_cond = self.where_cond.clone();
        count_builder.group_by = self.group_by.clone();
        count_builder.having = self.having.clone();
        let q = count_builder.compose(conn.dialect())?;
        q.fetch_scalar_one(conn).await
    }

    /// Run `count()` and a paginated `find()`, bundling both into a [`Page`].
    pub async fn paginate<T: FromRow>(
        &self,
        conn: &impl Executor,
        page: i64,
        per_page: i64,
    ) -> DbResult<Page<T>> {
        let mut windowed = self.clone();
        windowed.paginate_window(page, per_page)?;
        let total = self.count(conn).await?;
        let items = windowed.find(conn).await?;
        Ok(Page::new(items, page, per_page, total))
    }
}

impl SqlBuilder for QueryBuilder {
    /// Idealized `?`-placeholder rendering for debug logging, as if run
    /// against Postgres (pagination SQL varies per dialect; this renders
    /// the dialect-neutral form before `Dialect::paginate` wraps it).
    fn build_sql(&self) -> String {
        self.compose(&crate::dialect::PostgresDialect)
            .map(|q| q.to_sql())
            .unwrap_or_else(|e| format!("<invalid QueryBuilder: {e}>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqlServerDialect};

    #[test]
    fn base_select_with_where() {
        let mut qb = QueryBuilder::new("users");
        qb.and_eq("id", 1i64).unwrap();
        let q = qb.compose(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE id = ?");
    }

    #[test]
    fn pagination_wraps_with_dialect() {
        let mut qb = QueryBuilder::new("users");
        qb.order_by("id").limit(10).offset(20);
        let q = qb.compose_paginated(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn sqlserver_pagination_requires_order_by() {
        let mut qb = QueryBuilder::new("users");
        qb.limit(10);
        assert!(qb.compose_paginated(&SqlServerDialect).is_err());
    }

    #[test]
    fn sqlserver_pagination_binds_offset_then_limit() {
        let mut qb = QueryBuilder::new("users");
        qb.order_by("id").limit(10).offset(20);
        let q = qb.compose_paginated(&SqlServerDialect).unwrap();
        assert!(q.to_sql().contains("OFFSET ? ROWS FETCH NEXT ? ROWS ONLY"));
    }

    #[test]
    fn apply_soft_delete_filters_live_rows_by_default() {
        use crate::feature::{SoftDeleteConfig, SoftDeleteKind};
        let registry = FeatureRegistry::new();
        registry.register_soft_delete(
            "docs",
            SoftDeleteConfig { column: "deleted_at".into(), kind: SoftDeleteKind::Timestamp },
        );
        let mut qb = QueryBuilder::new("docs");
        qb.apply_soft_delete(&registry);
        let q = qb.compose(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "SELECT * FROM docs WHERE deleted_at IS NULL");
    }

    #[test]
    fn with_trashed_skips_the_soft_delete_filter() {
        use crate::feature::{SoftDeleteConfig, SoftDeleteKind};
        let registry = FeatureRegistry::new();
        registry.register_soft_delete(
            "docs",
            SoftDeleteConfig { column: "deleted_at".into(), kind: SoftDeleteKind::Timestamp },
        );
        let mut qb = QueryBuilder::new("docs");
        qb.with_trashed().apply_soft_delete(&registry);
        let q = qb.compose(&PostgresDialect).unwrap();
        assert_eq!(q.to_sql(), "SELECT * FROM docs");
    }
}
