//! Dialect abstraction (spec §4.1).
//!
//! Every other component speaks one idealized SQL: `?` placeholders,
//! identifiers unquoted where the whitelist allows it. The [`Dialect`] trait
//! is the single seam where textual differences between engines are
//! centralized, grounded in the `other_examples` multi-dialect precedents
//! (`mantis_core::sql::dialect::SqlDialect`, `dataforge`'s
//! `quote_identifier`/`limit_clause` pattern) and tightened to this crate's
//! stricter placeholder-parity and pagination contracts.

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

pub use mssql::SqlServerDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{DbError, DbResult};
use crate::value::Value;

/// Which engine a handle talks to. Also doubles as the `driver` config option (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DialectKind {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
    Oracle,
}

impl DialectKind {
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            DialectKind::MySql => &MySqlDialect,
            DialectKind::Postgres => &PostgresDialect,
            DialectKind::Sqlite => &SqliteDialect,
            DialectKind::SqlServer => &SqlServerDialect,
            DialectKind::Oracle => &OracleDialect,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DialectKind::MySql => "mysql",
            DialectKind::Postgres => "postgresql",
            DialectKind::Sqlite => "sqlite",
            DialectKind::SqlServer => "sqlserver",
            DialectKind::Oracle => "oracle",
        }
    }
}

/// Outcome of a pagination rewrite: the dialect either appends/wraps the SQL
/// directly, or (Oracle) needs two extra bound args for the windowing
/// predicate, which the caller must append to its arg vector in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedSql {
    pub sql: String,
    /// Number of extra positional args this pagination form adds *before*
    /// limit/offset must be substituted (Oracle's nested-subquery form binds
    /// the limit/offset values a second time via its own placeholders).
    pub extra_args_before: usize,
}

/// Capability bits so callers can ask "does this dialect support X" instead
/// of special-casing dialect names at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectCapability {
    pub returning: bool,
    pub ilike: bool,
    pub offset_fetch: bool,
    pub rownum: bool,
}

/// Encapsulates all SQL textual differences across supported engines.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    fn capabilities(&self) -> DialectCapability;

    /// Rewrite the idealized `?`-placeholder SQL into this dialect's native
    /// placeholder syntax. `arg_count` must equal the number of `?` in `sql`;
    /// a mismatch is a programming error surfaced as `InvalidArgument`.
    fn rewrite_placeholders(&self, sql: &str, arg_count: usize) -> DbResult<String> {
        let found = sql.matches('?').count();
        if found != arg_count {
            return Err(DbError::invalid_argument(format!(
                "placeholder count mismatch: sql has {found} '?' but {arg_count} args were bound"
            )));
        }
        Ok(self.rewrite_placeholders_unchecked(sql))
    }

    /// Rewrite without the parity check (used internally once the count is
    /// already known to match, e.g. after composing sub-clauses).
    fn rewrite_placeholders_unchecked(&self, sql: &str) -> String;

    /// Quote an identifier for safe embedding. Identifiers passing the
    /// caller's whitelist check may be emitted unquoted by the composer;
    /// this method is used when quoting is unconditionally required.
    fn quote_identifier(&self, name: &str) -> String;

    /// Wrap `inner_sql` (a SELECT without its own LIMIT/OFFSET) to return the
    /// `[offset+1, offset+limit]` window. Pair with [`Dialect::paginate_args`]
    /// for the bound values in the order this SQL text expects them.
    fn paginate(&self, inner_sql: &str) -> PaginatedSql;

    /// The `?`-bound args [`Dialect::paginate`]'s SQL expects, in order.
    /// Every dialect here happens to bind exactly two values, but their
    /// meaning and order differ (e.g. Oracle binds the *upper* ROWNUM bound
    /// before the lower one), so this is not simply `[limit, offset]`.
    fn paginate_args(&self, limit: i64, offset: i64) -> Vec<Value> {
        vec![Value::I64(limit), Value::I64(offset)]
    }

    /// Whether `paginate` requires the inner SQL to carry a deterministic
    /// `ORDER BY` (SQL Server's OFFSET/FETCH form does; others tolerate an
    /// unordered window, though results are a formality without one).
    fn requires_order_by_for_pagination(&self) -> bool {
        false
    }

    /// SQL fragment appended/altered at compose time so a last-insert-id can
    /// be read back (e.g. Postgres `RETURNING`). Returns `None` if the
    /// dialect obtains the id some other way (driver-reported, or a separate
    /// statement after INSERT).
    fn returning_clause(&self, pk_column: &str) -> Option<String>;

    /// SQL to run directly after an INSERT when `returning_clause` is `None`
    /// and the id isn't driver-reported (e.g. SQL Server's SCOPE_IDENTITY()).
    fn last_insert_id_statement(&self, table: &str, pk_column: &str) -> Option<String>;
}

/// Returns true if `name` is safe to emit unquoted: `[A-Za-z_][A-Za-z0-9_]*`
/// with optional `schema.table` dotting. Anything else must be quoted.
pub fn is_safe_unquoted(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    name.split('.').all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            _ => return false,
        }
        !part.is_empty() && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_unquoted_accepts_dotted() {
        assert!(is_safe_unquoted("users"));
        assert!(is_safe_unquoted("public.users"));
        assert!(is_safe_unquoted("_private"));
    }

    #[test]
    fn safe_unquoted_rejects_unsafe() {
        assert!(!is_safe_unquoted(""));
        assert!(!is_safe_unquoted("1table"));
        assert!(!is_safe_unquoted("a b"));
        assert!(!is_safe_unquoted("a;DROP TABLE x"));
        assert!(!is_safe_unquoted("schema..table"));
    }
}
