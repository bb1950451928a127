//! The dynamic value type bound to query placeholders and stored in [`crate::Record`].

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A driver-native payload the core doesn't interpret.
///
/// Backends populate this for column types dbkit has no opinion about
/// (arrays, JSON, UUID, enums, ...); it round-trips through `Record` opaquely.
/// `Send + Sync` so a `Value` can cross an `await` point inside query building.
#[derive(Clone)]
pub struct RawValue(pub Arc<dyn std::any::Any + Send + Sync>);

impl RawValue {
    pub fn new<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: std::any::Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawValue(..)")
    }
}

impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A variant-valued column value.
///
/// This is the currency bound to `?` placeholders and stored in a [`crate::Record`].
/// It is intentionally small and dialect-neutral; each backend converts to and
/// from its own wire representation.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Raw(RawValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical stringification used by the cache fingerprint (§4.5): every
    /// variant renders deterministically so two textually-identical queries
    /// with equal args hash identically across processes.
    pub fn canonical_string(&self) -> String {
        match self {
            Value::Null => "\0N".to_string(),
            Value::I64(v) => format!("\0I{v}"),
            Value::F64(v) => format!("\0F{v}"),
            Value::Bool(v) => format!("\0B{v}"),
            Value::Str(v) => format!("\0S{v}"),
            Value::Bytes(v) => format!("\0X{}", hex_encode(v)),
            Value::Timestamp(v) => format!("\0T{}", v.to_rfc3339()),
            Value::Raw(_) => "\0R<raw>".to_string(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            Value::F64(v) => Some(*v as i64),
            Value::Bool(v) => Some(*v as i64),
            Value::Str(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            Value::I64(v) => Some(*v as f64),
            Value::Str(v) => v.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::I64(v) => Some(*v != 0),
            Value::Str(v) => match v.to_ascii_lowercase().as_str() {
                "t" | "true" | "1" | "yes" => Some(true),
                "f" | "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(*v),
            Value::Str(v) => DateTime::parse_from_rfc3339(v).ok().map(|d| d.with_timezone(&Utc)),
            _ => None,
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

macro_rules! impl_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        }
    };
}

impl_from!(i64, I64);
impl_from!(i32, I64);
impl_from!(bool, Bool);
impl_from!(String, Str);
impl_from!(Vec<u8>, Bytes);
impl_from!(DateTime<Utc>, Timestamp);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
