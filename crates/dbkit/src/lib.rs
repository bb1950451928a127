//! # dbkit
//!
//! A lightweight, multi-dialect database access toolkit for Rust.
//!
//! ## Features
//!
//! - **SQL explicit**: compose idealized `?`-placeholder SQL via [`Sql`], or
//!   reach for the table [`builder`]s for common CRUD shapes.
//! - **Multi-dialect**: one [`Dialect`] trait, five implementations
//!   (Postgres, MySQL, SQLite, SQL Server, Oracle) — the same builder code
//!   runs against any of them.
//! - **Type-safe mapping**: row → [`Record`] always; row → struct via
//!   [`row::FromRow`] when a typed shape is worth naming.
//! - **Safe defaults**: `DELETE` requires `WHERE`, `UPDATE`/`INSERT` require
//!   a non-empty column list.
//! - **Ambient features**: timestamps, optimistic locking, and soft delete
//!   are opt-in per table via [`feature::FeatureRegistry`] and applied
//!   through [`interceptor`].

pub mod backend;
pub mod batch;
pub mod builder;
pub mod cache;
pub mod client;
pub mod condition;
pub mod dialect;
pub mod error;
pub mod feature;
pub mod ident;
pub mod interceptor;
pub mod monitor;
pub mod page;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod row;
pub mod sql;
pub mod transaction;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pool;

#[cfg(feature = "serde")]
pub mod config;

pub use client::Executor;
pub use condition::{Condition, Connector, Op};
pub use dialect::{Dialect, DialectKind};
pub use error::{DbError, DbResult};
pub use ident::{Ident, IntoIdent};
pub use page::Page;
pub use record::Record;
pub use row::{FromRow, ModelMeta, Row};
pub use sql::{Sql, sql};
pub use transaction::{Transaction, TransactionSource, transaction};
pub use value::Value;

pub use builder::{DeleteBuilder, InsertBuilder, MutationBuilder, QueryBuilder, SqlBuilder, Table, UpdateBuilder};

pub use registry::{close, close_all, default_db, register, register_default, runtime, use_db};

#[cfg(feature = "derive")]
pub use dbkit_derive::{FromRow, Model};
