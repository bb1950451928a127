use super::{Dialect, DialectCapability, DialectKind, PaginatedSql};
use crate::value::Value;

/// `@P1, @P2, ...` placeholders, bracket-quoted identifiers,
/// `SCOPE_IDENTITY()` for last-insert-id, `OFFSET ? ROWS FETCH NEXT ? ROWS
/// ONLY` pagination (requires a stable `ORDER BY` on the inner query).
pub struct SqlServerDialect;

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn capabilities(&self) -> DialectCapability {
        DialectCapability { returning: false, ilike: false, offset_fetch: true, rownum: false }
    }

    fn rewrite_placeholders_unchecked(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0usize;
        for c in sql.chars() {
            if c == '?' {
                n += 1;
                out.push_str("@P");
                out.push_str(&n.to_string());
            } else {
                out.push(c);
            }
        }
        out
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn paginate(&self, inner_sql: &str) -> PaginatedSql {
        PaginatedSql {
            sql: format!("{inner_sql} OFFSET ? ROWS FETCH NEXT ? ROWS ONLY"),
            extra_args_before: 0,
        }
    }

    fn requires_order_by_for_pagination(&self) -> bool {
        true
    }

    /// `OFFSET ? ROWS FETCH NEXT ? ROWS ONLY` binds offset before limit.
    fn paginate_args(&self, limit: i64, offset: i64) -> Vec<Value> {
        vec![Value::I64(offset), Value::I64(limit)]
    }

    fn returning_clause(&self, _pk_column: &str) -> Option<String> {
        None
    }

    fn last_insert_id_statement(&self, _table: &str, _pk_column: &str) -> Option<String> {
        Some("SELECT SCOPE_IDENTITY()".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_at_p_placeholders() {
        let d = SqlServerDialect;
        assert_eq!(d.rewrite_placeholders_unchecked("a = ? AND b = ?"), "a = @P1 AND b = @P2");
    }

    #[test]
    fn requires_order_by() {
        assert!(SqlServerDialect.requires_order_by_for_pagination());
    }
}
