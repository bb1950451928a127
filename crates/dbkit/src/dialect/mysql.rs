use super::{Dialect, DialectCapability, DialectKind, PaginatedSql};

/// `?` placeholders pass through unchanged (MySQL's native style),
/// backtick-quoted identifiers, `LAST_INSERT_ID()` for last-insert-id,
/// `LIMIT ? OFFSET ?` pagination.
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn capabilities(&self) -> DialectCapability {
        DialectCapability { returning: false, ilike: false, offset_fetch: false, rownum: false }
    }

    fn rewrite_placeholders_unchecked(&self, sql: &str) -> String {
        sql.to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn paginate(&self, inner_sql: &str) -> PaginatedSql {
        PaginatedSql { sql: format!("{inner_sql} LIMIT ? OFFSET ?"), extra_args_before: 0 }
    }

    fn returning_clause(&self, _pk_column: &str) -> Option<String> {
        None
    }

    fn last_insert_id_statement(&self, _table: &str, _pk_column: &str) -> Option<String> {
        Some("SELECT LAST_INSERT_ID()".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_pass_through() {
        let d = MySqlDialect;
        assert_eq!(d.rewrite_placeholders_unchecked("a = ? AND b = ?"), "a = ? AND b = ?");
    }

    #[test]
    fn quotes_with_backticks() {
        let d = MySqlDialect;
        assert_eq!(d.quote_identifier("order"), "`order`");
    }
}
