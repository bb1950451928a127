//! Error types for dbkit.

use thiserror::Error;

/// Result type alias for dbkit operations.
pub type DbResult<T> = Result<T, DbError>;

/// Error taxonomy for database operations.
///
/// Variants name a *condition*, not a driver detail: every backend maps its
/// native errors onto this set so callers never have to match on
/// driver-specific error types.
#[derive(Debug, Error)]
pub enum DbError {
    /// Handle could not open/ping, or the pool was exhausted past its timeout.
    #[error("connection error: {0}")]
    Connection(String),

    /// A structured identifier (table/column name) failed the safety whitelist.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Placeholder count didn't match bound args, page/pageSize out of range,
    /// or a model call is missing its primary key.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A feature was requested on a dialect that doesn't support it.
    #[error("dialect '{dialect}' does not support: {feature}")]
    DialectUnsupported { dialect: &'static str, feature: &'static str },

    /// Optimistic-lock interceptor detected a stale version on UPDATE.
    #[error("version mismatch on table '{table}': expected version {expected}")]
    VersionMismatch { table: String, expected: i64 },

    /// delete/restore invoked with soft-delete enabled but no per-table config.
    #[error("soft delete requested on '{table}' but no soft-delete config is registered")]
    SoftDeleteMissingConfig { table: String },

    /// Row not found where exactly one was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error, naming the offending column and field.
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Any other driver-surfaced failure (syntax, constraint violation, etc).
    #[error("driver error: {0}")]
    Driver(String),

    /// Deadline exceeded or an explicit cancellation signal was delivered.
    #[error("operation canceled: {0}")]
    Cancellation(String),

    /// Non-fatal: the cache layer logs this at `warn` and falls through to the
    /// database. It is never returned from a builder's terminal methods.
    #[error("cache error: {0}")]
    Cache(String),

    /// Nested `transaction()` call on an already-open scope.
    #[error("nested transaction is not supported; reuse the enclosing scope")]
    NestedTransaction,

    /// Misconfiguration: calling a model/registry method without the required setup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure (cache payloads, JSON columns).
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DbError {
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier(name.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode { column: column.into(), message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn dialect_unsupported(dialect: &'static str, feature: &'static str) -> Self {
        Self::DialectUnsupported { dialect, feature }
    }

    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, Self::VersionMismatch { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancellation(_))
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return Self::Driver(format!(
                "{}: {} ({})",
                db_err.code().code(),
                db_err.message(),
                constraint
            ));
        }
        Self::Driver(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Driver(err.to_string())
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DbError {
    fn from(err: mysql_async::Error) -> Self {
        Self::Driver(err.to_string())
    }
}

#[cfg(feature = "mssql")]
impl From<tiberius::error::Error> for DbError {
    fn from(err: tiberius::error::Error) -> Self {
        Self::Driver(err.to_string())
    }
}
