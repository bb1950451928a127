//! SQLite backend: `rusqlite::Connection` wrapped as a [`crate::client::Executor`].
//!
//! `rusqlite` is synchronous; every call runs the actual query on a blocking
//! thread via `tokio::task::spawn_blocking`, guarded by a `std::sync::Mutex`
//! so one logical connection still serializes its statements the way a
//! single SQLite connection must.

use crate::client::Executor;
use crate::dialect::{Dialect, SqliteDialect};
use crate::error::{DbError, DbResult};
use crate::record::Record;
use crate::row::Row as DbRow;
use crate::transaction::TransactionSource;
use crate::value::Value;
use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};
use std::sync::{Arc, Mutex};

impl rusqlite::types::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::I64(v) => ToSqlOutput::Owned(SqliteValue::Integer(*v)),
            Value::F64(v) => ToSqlOutput::Owned(SqliteValue::Real(*v)),
            Value::Bool(v) => ToSqlOutput::Owned(SqliteValue::Integer(*v as i64)),
            Value::Str(v) => ToSqlOutput::Owned(SqliteValue::Text(v.clone())),
            Value::Bytes(v) => ToSqlOutput::Owned(SqliteValue::Blob(v.clone())),
            Value::Timestamp(v) => ToSqlOutput::Owned(SqliteValue::Text(v.to_rfc3339())),
            Value::Raw(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(
                    "a RawValue cannot be bound directly to a SQLite statement".into(),
                ));
            }
        })
    }
}

fn value_from_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::I64(i),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(t) => Value::Str(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn run_query(conn: &rusqlite::Connection, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let params = rusqlite::params_from_iter(args.iter());
    let mut rows_iter = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows_iter.next()? {
        let mut record = Record::new();
        for (idx, name) in column_names.iter().enumerate() {
            record.set(name.clone(), value_from_ref(row.get_ref(idx)?));
        }
        out.push(DbRow::from_record(record));
    }
    Ok(out)
}

fn run_execute(conn: &rusqlite::Connection, sql: &str, args: &[Value]) -> DbResult<u64> {
    let params = rusqlite::params_from_iter(args.iter());
    Ok(conn.execute(sql, params)? as u64)
}

/// A registered handle over a single SQLite connection.
pub struct SqliteDb {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteDb {
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }

    async fn with_conn<T, F>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&guard)
        })
        .await
        .map_err(|e| DbError::Driver(format!("sqlite task panicked: {e}")))?
    }
}

#[async_trait]
impl Executor for SqliteDb {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let args = args.to_vec();
        self.with_conn(move |conn| run_query(conn, &native_sql, &args)).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let args = args.to_vec();
        self.with_conn(move |conn| run_execute(conn, &native_sql, &args)).await
    }
}

#[async_trait]
impl TransactionSource for SqliteDb {
    async fn begin(&self) -> DbResult<Arc<dyn Executor>> {
        self.execute("BEGIN", &[]).await?;
        Ok(Arc::new(SqliteTxExecutor { conn: self.conn.clone() }))
    }

    async fn commit(&self, tx: Arc<dyn Executor>) -> DbResult<()> {
        tx.execute("COMMIT", &[]).await?;
        Ok(())
    }

    async fn rollback(&self, tx: Arc<dyn Executor>) -> DbResult<()> {
        tx.execute("ROLLBACK", &[]).await?;
        Ok(())
    }
}

/// The same connection, flagged as `in_transaction()` so a nested
/// `transaction()` call is rejected (a single SQLite connection cannot run
/// two overlapping `BEGIN`s).
struct SqliteTxExecutor {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

#[async_trait]
impl Executor for SqliteTxExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let args = args.to_vec();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            run_query(&guard, &native_sql, &args)
        })
        .await
        .map_err(|e| DbError::Driver(format!("sqlite task panicked: {e}")))?
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let args = args.to_vec();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            run_execute(&guard, &native_sql, &args)
        })
        .await
        .map_err(|e| DbError::Driver(format!("sqlite task panicked: {e}")))?
    }

    fn in_transaction(&self) -> bool {
        true
    }
}
