use super::{Dialect, DialectCapability, DialectKind, PaginatedSql};
use crate::value::Value;

/// `:1, :2, ...` bind placeholders, double-quoted identifiers (needed to
/// preserve case — Oracle otherwise folds unquoted identifiers to upper
/// case, a footgun callers should be aware of, §9), `RETURNING ... INTO` for
/// last-insert-id, and a two-level nested-subquery `ROWNUM` pagination form
/// since Oracle versions predating 12c have no `OFFSET/FETCH`.
///
/// No async-native Oracle driver exists in the published crate ecosystem at
/// this crate's MSRV; `last_insert_id_statement`/`returning_clause` describe
/// the SQL a backend would issue, but no `backend::oracle` wiring ships here
/// (documented as an open decision).
pub struct OracleDialect;

impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn capabilities(&self) -> DialectCapability {
        DialectCapability { returning: true, ilike: false, offset_fetch: false, rownum: true }
    }

    fn rewrite_placeholders_unchecked(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0usize;
        for c in sql.chars() {
            if c == '?' {
                n += 1;
                out.push(':');
                out.push_str(&n.to_string());
            } else {
                out.push(c);
            }
        }
        out
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.to_ascii_uppercase().replace('"', "\"\""))
    }

    /// Oracle pre-12c has no `LIMIT`/`OFFSET`/`FETCH`; a `ROWNUM` window is
    /// built from two nested subqueries:
    ///
    /// ```sql
    /// SELECT * FROM (
    ///   SELECT inner_.*, ROWNUM rnum_ FROM (<inner_sql>) inner_
    ///   WHERE ROWNUM <= ?
    /// ) WHERE rnum_ > ?
    /// ```
    ///
    /// The outer bound (`<= offset + limit`) and inner bound (`> offset`) are
    /// both supplied by the caller as two additional trailing args, hence
    /// `extra_args_before == 0` and two placeholders rather than one pair of
    /// limit/offset values directly.
    fn paginate(&self, inner_sql: &str) -> PaginatedSql {
        let sql = format!(
            "SELECT * FROM (SELECT inner_.*, ROWNUM rnum_ FROM ({inner_sql}) inner_ WHERE ROWNUM <= ?) WHERE rnum_ > ?"
        );
        PaginatedSql { sql, extra_args_before: 0 }
    }

    fn requires_order_by_for_pagination(&self) -> bool {
        true
    }

    /// Outer `ROWNUM <= offset+limit` is bound first, inner `rnum_ > offset` second.
    fn paginate_args(&self, limit: i64, offset: i64) -> Vec<Value> {
        vec![Value::I64(offset + limit), Value::I64(offset)]
    }

    fn returning_clause(&self, pk_column: &str) -> Option<String> {
        Some(format!("RETURNING {pk_column} INTO ?"))
    }

    fn last_insert_id_statement(&self, _table: &str, _pk_column: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_colon_placeholders() {
        let d = OracleDialect;
        assert_eq!(d.rewrite_placeholders_unchecked("a = ? AND b = ?"), "a = :1 AND b = :2");
    }

    #[test]
    fn quotes_and_upcases() {
        let d = OracleDialect;
        assert_eq!(d.quote_identifier("users"), "\"USERS\"");
    }

    #[test]
    fn paginate_nests_rownum_subqueries() {
        let d = OracleDialect;
        let p = d.paginate("SELECT id FROM t ORDER BY id");
        assert!(p.sql.contains("ROWNUM rnum_"));
        assert!(p.sql.contains("WHERE rnum_ > ?"));
    }
}
