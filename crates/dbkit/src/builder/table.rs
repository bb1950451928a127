//! `Table` const descriptor: a small ergonomic wrapper that creates builders
//! with a consistent select/returning column list and primary-key name,
//! without having to repeat them at every call site.

use super::delete::DeleteBuilder;
use super::insert::InsertBuilder;
use super::select::QueryBuilder;
use super::update::UpdateBuilder;
use crate::record::Record;
use crate::value::Value;

/// ```ignore
/// const USERS: Table = Table::new("users")
///     .with_select_cols(&["id", "username", "email", "created_at"])
///     .with_id_col("id");
///
/// let mut qb = USERS.select();
/// qb.and_eq("id", 1i64)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub select_cols: &'static [&'static str],
    pub id_col: &'static str,
}

impl Table {
    pub const fn new(name: &'static str) -> Self {
        Self { name, select_cols: &["*"], id_col: "id" }
    }

    pub const fn with_select_cols(mut self, cols: &'static [&'static str]) -> Self {
        self.select_cols = cols;
        self
    }

    pub const fn with_id_col(mut self, col: &'static str) -> Self {
        self.id_col = col;
        self
    }

    pub fn select(&self) -> QueryBuilder {
        let mut qb = QueryBuilder::new(self.name);
        if !self.select_cols.is_empty() && (self.select_cols.len() > 1 || self.select_cols[0] != "*") {
            qb.select_cols(self.select_cols);
        }
        qb
    }

    pub fn insert(&self, record: Record) -> InsertBuilder {
        InsertBuilder::new(self.name, record)
    }

    pub fn update(&self) -> UpdateBuilder {
        UpdateBuilder::new(self.name)
    }

    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.name)
    }

    pub fn update_by_id(&self, id: impl Into<Value>) -> crate::error::DbResult<UpdateBuilder> {
        let mut builder = self.update();
        builder.and_eq(self.id_col, id)?;
        Ok(builder)
    }

    pub fn delete_by_id(&self, id: impl Into<Value>) -> crate::error::DbResult<DeleteBuilder> {
        let mut builder = self.delete();
        builder.and_eq(self.id_col, id)?;
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::super::traits::SqlBuilder;
    use super::*;

    const USERS: Table = Table::new("users").with_select_cols(&["id", "name"]).with_id_col("id");

    #[test]
    fn select_applies_configured_columns() {
        let qb = USERS.select();
        assert_eq!(qb.build_sql(), "SELECT id, name FROM users");
    }

    #[test]
    fn update_by_id_seeds_where_clause() {
        let ub = USERS.update_by_id(1i64).unwrap();
        assert_eq!(ub.build_sql(), "UPDATE users SET _error_no_set_fields = 1 WHERE 1=0");
    }

    #[test]
    fn delete_by_id_seeds_where_clause() {
        let db = USERS.delete_by_id(1i64).unwrap();
        assert_eq!(db.build_sql(), "DELETE FROM users WHERE id = ?");
    }
}
