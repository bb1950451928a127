use super::{Dialect, DialectCapability, DialectKind, PaginatedSql};

/// `?` placeholders pass through, double-quoted identifiers (SQLite accepts
/// either double quotes or backticks; double quotes match the ANSI-ish
/// convention the rest of the crate otherwise uses), `last_insert_rowid()`
/// for last-insert-id, `LIMIT ? OFFSET ?` pagination.
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn capabilities(&self) -> DialectCapability {
        DialectCapability { returning: true, ilike: false, offset_fetch: false, rownum: false }
    }

    fn rewrite_placeholders_unchecked(&self, sql: &str) -> String {
        sql.to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn paginate(&self, inner_sql: &str) -> PaginatedSql {
        PaginatedSql { sql: format!("{inner_sql} LIMIT ? OFFSET ?"), extra_args_before: 0 }
    }

    fn returning_clause(&self, pk_column: &str) -> Option<String> {
        // SQLite (3.35+) supports RETURNING; the backend falls back to
        // `last_insert_rowid()` if the runtime library predates it.
        Some(format!("RETURNING {pk_column}"))
    }

    fn last_insert_id_statement(&self, _table: &str, _pk_column: &str) -> Option<String> {
        Some("SELECT last_insert_rowid()".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_pass_through() {
        let d = SqliteDialect;
        assert_eq!(d.rewrite_placeholders_unchecked("a = ?"), "a = ?");
    }
}
