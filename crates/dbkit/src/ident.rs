//! Safe SQL identifier handling.
//!
//! This module provides [`Ident`], representing a SQL identifier
//! (schema/table/column) with dotted and quoted notation.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`
//!
//! Identifiers are composed once at builder-construction time and rendered
//! with [`Ident::to_sql`] (dialect-neutral, ANSI double-quote form) or
//! [`Ident::to_sql_dialect`] (per-dialect quoting, via [`crate::dialect::Dialect::quote_identifier`]).

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier: allows any characters except NUL.
    Quoted(String),
}

/// A SQL identifier (column, table, or schema name).
///
/// Supports dotted notation (e.g., `schema.table.column`) and quoted
/// identifiers (e.g., `"CamelCase"."User"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Create a quoted identifier.
    pub fn quoted(name: &str) -> DbResult<Self> {
        if name.is_empty() {
            return Err(DbError::invalid_identifier("empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(DbError::invalid_identifier("identifier cannot contain NUL character"));
        }
        Ok(Self { parts: vec![IdentPart::Quoted(name.to_string())] })
    }

    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table.column`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable".id`
    pub fn parse(s: &str) -> DbResult<Self> {
        if s.is_empty() {
            return Err(DbError::invalid_identifier("identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(DbError::invalid_identifier("identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(DbError::invalid_identifier("trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(DbError::invalid_identifier(format!(
                            "expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => return Err(DbError::invalid_identifier("unclosed quoted identifier")),
                    }
                }
                if name.is_empty() {
                    return Err(DbError::invalid_identifier("empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                if name.is_empty() {
                    if c == '_' || c.is_ascii_alphabetic() {
                        name.push(c);
                        chars.next();
                    } else {
                        return Err(DbError::invalid_identifier(format!(
                            "invalid identifier start character: '{c}'"
                        )));
                    }
                } else if c == '_' || c == '$' || c.is_ascii_alphanumeric() {
                    name.push(c);
                    chars.next();
                } else {
                    return Err(DbError::invalid_identifier(format!(
                        "invalid character in identifier: '{c}'"
                    )));
                }
            }
            if name.is_empty() {
                return Err(DbError::invalid_identifier("empty identifier segment"));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        if parts.is_empty() {
            return Err(DbError::invalid_identifier("empty identifier"));
        }

        Ok(Self { parts })
    }

    /// Render as dialect-neutral ANSI SQL (double-quoted parts stay quoted,
    /// unquoted parts stay bare). Used when composing builder SQL ahead of
    /// the final per-dialect rewrite pass.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    /// Render using `dialect`'s quoting rules for every part (used when a
    /// part must be unconditionally quoted, e.g. Oracle's case-preservation).
    pub fn to_sql_dialect(&self, dialect: &dyn Dialect) -> String {
        self.parts
            .iter()
            .map(|p| match p {
                IdentPart::Unquoted(s) | IdentPart::Quoted(s) => dialect.quote_identifier(s),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    for ch in s.chars() {
                        if ch == '"' {
                            out.push('"');
                            out.push('"');
                        } else {
                            out.push(ch);
                        }
                    }
                    out.push('"');
                }
            }
        }
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Convert an input into an [`Ident`]. Mainly for ergonomics in builder APIs
/// that accept `impl IntoIdent` column/table names.
pub trait IntoIdent {
    fn into_ident(self) -> DbResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> DbResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> DbResult<Ident> {
        Ident::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.to_sql(), "users");
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("public.users").unwrap();
        assert_eq!(ident.to_sql(), "public.users");
    }

    #[test]
    fn ident_three_parts() {
        let ident = Ident::parse("schema.table.column").unwrap();
        assert_eq!(ident.to_sql(), "schema.table.column");
    }

    #[test]
    fn ident_quoted() {
        let ident = Ident::parse(r#""CamelCase""#).unwrap();
        assert_eq!(ident.to_sql(), r#""CamelCase""#);
    }

    #[test]
    fn ident_quoted_with_escape() {
        let ident = Ident::parse(r#""has""quote""#).unwrap();
        assert_eq!(ident.to_sql(), r#""has""quote""#);
    }

    #[test]
    fn ident_mixed_quoted_unquoted() {
        let ident = Ident::parse(r#"public."UserTable".id"#).unwrap();
        assert_eq!(ident.to_sql(), r#"public."UserTable".id"#);
    }

    #[test]
    fn ident_with_dollar() {
        let ident = Ident::parse("my_var$1").unwrap();
        assert_eq!(ident.to_sql(), "my_var$1");
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::parse("").is_err());
    }

    #[test]
    fn ident_rejects_start_digit() {
        assert!(Ident::parse("1table").is_err());
    }

    #[test]
    fn ident_rejects_space() {
        assert!(Ident::parse("my table").is_err());
    }

    #[test]
    fn ident_rejects_double_dot() {
        assert!(Ident::parse("schema..table").is_err());
    }

    #[test]
    fn ident_rejects_trailing_dot() {
        assert!(Ident::parse("schema.").is_err());
    }

    #[test]
    fn ident_rejects_unclosed_quote() {
        assert!(Ident::parse(r#""unclosed"#).is_err());
    }

    #[test]
    fn display_matches_to_sql() {
        let ident = Ident::parse("public.users").unwrap();
        assert_eq!(ident.to_string(), ident.to_sql());
    }
}
