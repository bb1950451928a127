//! Row mapping: dialect-neutral result rows and the `FromRow` conversion trait.

use crate::error::DbError;
use crate::error::DbResult;
use crate::record::Record;
use crate::value::Value;
use chrono::{DateTime, Utc};

/// One result row, backed by the same ordered/case-insensitive [`Record`]
/// used for DML payloads. Every backend converts its native row type into a
/// `Row` at the edge so the rest of the crate never sees driver types.
#[derive(Debug, Clone, Default)]
pub struct Row(Record);

impl Row {
    pub fn from_record(record: Record) -> Self {
        Self(record)
    }

    pub fn record(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }

    /// Typed column access. Returns `DbError::Decode` naming the column on
    /// conversion failure, never panics.
    pub fn try_get<T: FromValue>(&self, column: &str) -> DbResult<T> {
        let value = self.0.get(column).ok_or_else(|| {
            DbError::decode(column, "column not present in row")
        })?;
        T::from_value(column, value)
    }
}

/// Convert a [`Value`] into a typed field. Implemented for the scalar types
/// `Value` can carry plus `Option<T>` for nullable columns.
pub trait FromValue: Sized {
    fn from_value(column: &str, value: &Value) -> DbResult<Self>;
}

macro_rules! impl_from_value_via {
    ($ty:ty, $accessor:ident, $label:literal) => {
        impl FromValue for $ty {
            fn from_value(column: &str, value: &Value) -> DbResult<Self> {
                value
                    .$accessor()
                    .map(|v| v as $ty)
                    .ok_or_else(|| DbError::decode(column, concat!("expected ", $label)))
            }
        }
    };
}

impl_from_value_via!(i64, as_i64, "an integer");
impl_from_value_via!(i32, as_i64, "an integer");
impl_from_value_via!(f64, as_f64, "a float");
impl_from_value_via!(bool, as_bool, "a boolean");

impl FromValue for String {
    fn from_value(column: &str, value: &Value) -> DbResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DbError::decode(column, "expected a string"))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(column: &str, value: &Value) -> DbResult<Self> {
        value
            .as_bytes()
            .map(|b| b.to_vec())
            .ok_or_else(|| DbError::decode(column, "expected bytes"))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(column: &str, value: &Value) -> DbResult<Self> {
        value
            .as_timestamp()
            .ok_or_else(|| DbError::decode(column, "expected a timestamp"))
    }
}

impl FromValue for Value {
    fn from_value(_column: &str, value: &Value) -> DbResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(column: &str, value: &Value) -> DbResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(column, value).map(Some)
        }
    }
}

/// Convert a database row into a Rust struct.
///
/// Normally derived with `#[derive(FromRow)]` from `dbkit-derive`.
///
/// # Example
///
/// ```ignore
/// use dbkit::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> DbResult<Self>;
}

/// Duck-typed model metadata, normally derived with `#[derive(Model)]` from
/// `dbkit-derive` rather than implemented by hand.
///
/// Exists so generic helpers (batch operations, the feature interceptors)
/// can take `M: ModelMeta` and reach a table/column name without the caller
/// spelling out string literals at every call site.
pub trait ModelMeta {
    /// The table this model maps to.
    const TABLE: &'static str;

    /// The primary key column, if the struct has a `#[dbkit(id)]` field.
    const ID: Option<&'static str> = None;

    /// Every mapped column, in declaration order.
    fn columns() -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_get_roundtrips() {
        let mut rec = Record::new();
        rec.set("id", 7i64).set("name", "alice").set("email", Value::Null);
        let row = Row::from_record(rec);
        assert_eq!(row.try_get::<i64>("id").unwrap(), 7);
        assert_eq!(row.try_get::<String>("name").unwrap(), "alice");
        assert_eq!(row.try_get::<Option<String>>("email").unwrap(), None);
    }

    #[test]
    fn missing_column_is_decode_error() {
        let row = Row::from_record(Record::new());
        assert!(row.try_get::<i64>("nope").is_err());
    }
}
