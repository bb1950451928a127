//! Convenient imports for typical `dbkit` usage.
//!
//! ```ignore
//! use dbkit::prelude::*;
//! ```
//!
//! For advanced or backend-specific pieces (a specific driver, the monitor
//! hooks), import from [`crate::backend`] / [`crate::monitor`] directly.

// ── Core types ───────────────────────────────────────────────────────────
pub use crate::condition::{Condition, Connector, Op};
pub use crate::dialect::{Dialect, DialectKind};
pub use crate::error::{DbError, DbResult};
pub use crate::ident::{Ident, IntoIdent};
pub use crate::page::Page;
pub use crate::record::Record;
pub use crate::row::{FromRow, Row};
pub use crate::sql::{Sql, sql};
pub use crate::value::Value;

// ── Client / scopes ─────────────────────────────────────────────────────
pub use crate::client::Executor;
pub use crate::transaction::{Transaction, TransactionSource, transaction};

// ── Table builders ───────────────────────────────────────────────────────
pub use crate::builder::{
    DeleteBuilder, InsertBuilder, MutationBuilder, QueryBuilder, SqlBuilder, Table, UpdateBuilder,
};

// ── Features & interceptors ─────────────────────────────────────────────
pub use crate::feature::{FeatureRegistry, OptimisticLockConfig, SoftDeleteConfig, SoftDeleteKind, TimestampsConfig};
pub use crate::interceptor::SoftDeleteMode;

// ── Batch DML ─────────────────────────────────────────────────────────────
pub use crate::batch::{batch_delete_by_ids, batch_delete_records, batch_insert, batch_update};

// ── Cache read-through ───────────────────────────────────────────────────
pub use crate::cache::{CacheProvider, CachedValue, fingerprint, read_through};

// ── Registry ──────────────────────────────────────────────────────────────
pub use crate::registry::{close, close_all, default_db, register, register_default, use_db};

// ── Connection pooling (feature: postgres) ──────────────────────────────
#[cfg(feature = "postgres")]
pub use crate::pool::{create_pool, create_pool_with_config};

// ── Configuration (feature: serde) ───────────────────────────────────────
#[cfg(feature = "serde")]
pub use crate::config::Config;

// ── Derive macros (feature: derive) ──────────────────────────────────────
#[cfg(feature = "derive")]
pub use dbkit_derive::{FromRow, Model};
