use super::{Dialect, DialectCapability, DialectKind, PaginatedSql};

/// `$1, $2, ...` placeholders, double-quoted identifiers, `RETURNING` for
/// last-insert-id, `LIMIT ? OFFSET ?` pagination.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Postgres
    }

    fn capabilities(&self) -> DialectCapability {
        DialectCapability { returning: true, ilike: true, offset_fetch: false, rownum: false }
    }

    fn rewrite_placeholders_unchecked(&self, sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0usize;
        for c in sql.chars() {
            if c == '?' {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            } else {
                out.push(c);
            }
        }
        out
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn paginate(&self, inner_sql: &str) -> PaginatedSql {
        PaginatedSql { sql: format!("{inner_sql} LIMIT ? OFFSET ?"), extra_args_before: 0 }
    }

    fn returning_clause(&self, pk_column: &str) -> Option<String> {
        Some(format!("RETURNING {pk_column}"))
    }

    fn last_insert_id_statement(&self, _table: &str, _pk_column: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_sequential_dollar_placeholders() {
        let d = PostgresDialect;
        assert_eq!(
            d.rewrite_placeholders_unchecked("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = $2"
        );
    }

    #[test]
    fn quotes_with_doubled_inner_quote() {
        let d = PostgresDialect;
        assert_eq!(d.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }
}
