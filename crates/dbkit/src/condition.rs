//! WHERE-clause condition tree (spec §4.2).
//!
//! Conditions form a tree, not a flat list: every `.and()`/`.or()` that
//! crosses connectors introduces an explicit [`Condition::Group`], so
//! `a.and(b.or(c))` always parenthesizes the same way it reads. This
//! replaces the teacher's flat `Vec<String>` WHERE accumulation, which only
//! ever supported implicit-AND joining.

use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::ident::IntoIdent;
use crate::value::Value;

/// Per-column comparison operator. Carries its own operand(s) as [`Value`].
#[derive(Debug, Clone)]
pub enum Op {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(Value),
    Ilike(Value),
    NotLike(Value),
    IsNull,
    IsNotNull,
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Between(Value, Value),
    NotBetween(Value, Value),
}

/// How sibling conditions in a [`Condition::Group`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// A WHERE-clause predicate tree.
///
/// `Leaf` is a single `column OP value(s)` comparison. `Group` combines a
/// list of children with one connector, emitting parentheses around itself
/// whenever it is nested inside another group (so precedence always matches
/// how the tree was built, never operator-precedence surprises). `Not` wraps
/// a child in `NOT (...)`. `Raw` escapes to caller-supplied SQL plus its own
/// bound args, for expressions the builder has no typed form for.
#[derive(Debug, Clone)]
pub enum Condition {
    Leaf { column: String, op: Op },
    Group { connector: Connector, children: Vec<Condition> },
    Not(Box<Condition>),
    Raw { sql: String, args: Vec<Value> },
}

impl Condition {
    pub fn new(column: impl IntoIdent, op: Op) -> DbResult<Self> {
        Ok(Condition::Leaf { column: column.into_ident()?.to_string(), op })
    }

    pub fn eq(column: impl IntoIdent, value: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Eq(value.into()))
    }

    pub fn ne(column: impl IntoIdent, value: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Ne(value.into()))
    }

    pub fn gt(column: impl IntoIdent, value: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Gt(value.into()))
    }

    pub fn gte(column: impl IntoIdent, value: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Gte(value.into()))
    }

    pub fn lt(column: impl IntoIdent, value: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Lt(value.into()))
    }

    pub fn lte(column: impl IntoIdent, value: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Lte(value.into()))
    }

    pub fn like(column: impl IntoIdent, pattern: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Like(pattern.into()))
    }

    /// Case-insensitive LIKE. Dialects without native `ILIKE` (all but
    /// Postgres/SQLite) lower-case both sides at compose time instead.
    pub fn ilike(column: impl IntoIdent, pattern: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::Ilike(pattern.into()))
    }

    pub fn not_like(column: impl IntoIdent, pattern: impl Into<Value>) -> DbResult<Self> {
        Self::new(column, Op::NotLike(pattern.into()))
    }

    pub fn is_null(column: impl IntoIdent) -> DbResult<Self> {
        Self::new(column, Op::IsNull)
    }

    pub fn is_not_null(column: impl IntoIdent) -> DbResult<Self> {
        Self::new(column, Op::IsNotNull)
    }

    pub fn in_list(column: impl IntoIdent, values: Vec<impl Into<Value>>) -> DbResult<Self> {
        Self::new(column, Op::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in(column: impl IntoIdent, values: Vec<impl Into<Value>>) -> DbResult<Self> {
        Self::new(column, Op::NotIn(values.into_iter().map(Into::into).collect()))
    }

    pub fn between(
        column: impl IntoIdent,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> DbResult<Self> {
        Self::new(column, Op::Between(from.into(), to.into()))
    }

    pub fn not_between(
        column: impl IntoIdent,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> DbResult<Self> {
        Self::new(column, Op::NotBetween(from.into(), to.into()))
    }

    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Condition::Raw { sql: sql.into(), args }
    }

    pub fn not(self) -> Self {
        Condition::Not(Box::new(self))
    }

    /// Combine with `other` under AND. Flattens when `self` is already an
    /// ungrouped AND group, so `a.and(b).and(c)` stays one flat group rather
    /// than nesting three deep.
    pub fn and(self, other: Condition) -> Self {
        self.join(Connector::And, other)
    }

    pub fn or(self, other: Condition) -> Self {
        self.join(Connector::Or, other)
    }

    fn join(self, connector: Connector, other: Condition) -> Self {
        match self {
            Condition::Group { connector: c, mut children } if c == connector => {
                children.push(other);
                Condition::Group { connector, children }
            }
            other_self => Condition::Group { connector, children: vec![other_self, other] },
        }
    }

    pub fn group_and(children: Vec<Condition>) -> Self {
        Condition::Group { connector: Connector::And, children }
    }

    pub fn group_or(children: Vec<Condition>) -> Self {
        Condition::Group { connector: Connector::Or, children }
    }

    /// Render this node into `sql`, pushing bound placeholder args onto
    /// `args` in left-to-right order. `top_level` suppresses the outer
    /// parens a `Group` would otherwise wrap itself in (the builder's WHERE
    /// clause doesn't need `WHERE (a AND b)`).
    pub fn compile(
        &self,
        dialect: &dyn Dialect,
        top_level: bool,
        sql: &mut String,
        args: &mut Vec<Value>,
    ) -> DbResult<()> {
        match self {
            Condition::Leaf { column, op } => {
                compile_leaf(column, op, dialect, sql, args)?;
            }
            Condition::Not(inner) => {
                sql.push_str("NOT (");
                inner.compile(dialect, true, sql, args)?;
                sql.push(')');
            }
            Condition::Raw { sql: raw, args: raw_args } => {
                sql.push_str(raw);
                args.extend(raw_args.iter().cloned());
            }
            Condition::Group { connector, children } => {
                if children.is_empty() {
                    // An empty group is vacuously true; emit a tautology rather
                    // than malformed SQL.
                    sql.push_str("1=1");
                    return Ok(());
                }
                let joiner = match connector {
                    Connector::And => " AND ",
                    Connector::Or => " OR ",
                };
                if !top_level {
                    sql.push('(');
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(joiner);
                    }
                    let child_needs_parens = matches!(child, Condition::Group { .. });
                    if child_needs_parens {
                        child.compile(dialect, false, sql, args)?;
                    } else {
                        child.compile(dialect, true, sql, args)?;
                    }
                }
                if !top_level {
                    sql.push(')');
                }
            }
        }
        Ok(())
    }
}

fn compile_leaf(
    column: &str,
    op: &Op,
    dialect: &dyn Dialect,
    sql: &mut String,
    args: &mut Vec<Value>,
) -> DbResult<()> {
    match op {
        Op::Eq(v) => {
            sql.push_str(column);
            sql.push_str(" = ?");
            args.push(v.clone());
        }
        Op::Ne(v) => {
            sql.push_str(column);
            sql.push_str(" <> ?");
            args.push(v.clone());
        }
        Op::Gt(v) => {
            sql.push_str(column);
            sql.push_str(" > ?");
            args.push(v.clone());
        }
        Op::Gte(v) => {
            sql.push_str(column);
            sql.push_str(" >= ?");
            args.push(v.clone());
        }
        Op::Lt(v) => {
            sql.push_str(column);
            sql.push_str(" < ?");
            args.push(v.clone());
        }
        Op::Lte(v) => {
            sql.push_str(column);
            sql.push_str(" <= ?");
            args.push(v.clone());
        }
        Op::Like(v) => {
            sql.push_str(column);
            sql.push_str(" LIKE ?");
            args.push(v.clone());
        }
        Op::NotLike(v) => {
            sql.push_str(column);
            sql.push_str(" NOT LIKE ?");
            args.push(v.clone());
        }
        Op::Ilike(v) => {
            if dialect.capabilities().ilike {
                sql.push_str(column);
                sql.push_str(" ILIKE ?");
                args.push(v.clone());
            } else {
                // No native ILIKE: fold both sides to lower-case. The value
                // itself is only lower-cased when it's a plain string; a
                // bound parameter that isn't a string is a caller error
                // surfaced by the backend's type coercion, not here.
                sql.push_str("LOWER(");
                sql.push_str(column);
                sql.push_str(") LIKE LOWER(?)");
                args.push(v.clone());
            }
        }
        Op::IsNull => {
            sql.push_str(column);
            sql.push_str(" IS NULL");
        }
        Op::IsNotNull => {
            sql.push_str(column);
            sql.push_str(" IS NOT NULL");
        }
        Op::In(values) => {
            if values.is_empty() {
                // An IN () with no values can never match; emit a tautological
                // falsehood instead of invalid SQL.
                sql.push_str("1=0");
            } else {
                sql.push_str(column);
                sql.push_str(" IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    args.push(v.clone());
                }
                sql.push(')');
            }
        }
        Op::NotIn(values) => {
            if values.is_empty() {
                sql.push_str("1=1");
            } else {
                sql.push_str(column);
                sql.push_str(" NOT IN (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    args.push(v.clone());
                }
                sql.push(')');
            }
        }
        Op::Between(from, to) => {
            sql.push_str(column);
            sql.push_str(" BETWEEN ? AND ?");
            args.push(from.clone());
            args.push(to.clone());
        }
        Op::NotBetween(from, to) => {
            sql.push_str(column);
            sql.push_str(" NOT BETWEEN ? AND ?");
            args.push(from.clone());
            args.push(to.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresDialect;

    fn compile(cond: &Condition) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut args = Vec::new();
        cond.compile(&PostgresDialect, true, &mut sql, &mut args).unwrap();
        (sql, args)
    }

    #[test]
    fn simple_leaf() {
        let c = Condition::eq("id", 5i64).unwrap();
        let (sql, args) = compile(&c);
        assert_eq!(sql, "id = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn and_join_flattens() {
        let c = Condition::eq("a", 1i64)
            .unwrap()
            .and(Condition::eq("b", 2i64).unwrap())
            .and(Condition::eq("c", 3i64).unwrap());
        let (sql, args) = compile(&c);
        assert_eq!(sql, "a = ? AND b = ? AND c = ?");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn or_inside_and_is_parenthesized() {
        let inner = Condition::eq("b", 2i64).unwrap().or(Condition::eq("c", 3i64).unwrap());
        let c = Condition::eq("a", 1i64).unwrap().and(inner);
        let (sql, _) = compile(&c);
        assert_eq!(sql, "a = ? AND (b = ? OR c = ?)");
    }

    #[test]
    fn not_wraps_in_not_parens() {
        let c = Condition::eq("a", 1i64).unwrap().not();
        let (sql, _) = compile(&c);
        assert_eq!(sql, "NOT (a = ?)");
    }

    #[test]
    fn empty_in_list_is_tautologically_false() {
        let c = Condition::in_list("a", Vec::<i64>::new()).unwrap();
        let (sql, args) = compile(&c);
        assert_eq!(sql, "1=0");
        assert!(args.is_empty());
    }

    #[test]
    fn ilike_without_capability_lowercases_both_sides() {
        use crate::dialect::MySqlDialect;
        let c = Condition::ilike("name", "%a%").unwrap();
        let mut sql = String::new();
        let mut args = Vec::new();
        c.compile(&MySqlDialect, true, &mut sql, &mut args).unwrap();
        assert_eq!(sql, "LOWER(name) LIKE LOWER(?)");
    }
}
