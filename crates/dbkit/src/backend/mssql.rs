//! SQL Server backend: `tiberius::Client` wrapped as a [`crate::client::Executor`].
//!
//! Best-effort wiring: tiberius speaks over an arbitrary `AsyncRead + AsyncWrite`
//! socket rather than owning its own pool, so `MssqlDb` holds one connection
//! behind a `tokio::sync::Mutex` rather than checking one out of a pool per
//! call, the way `PgDb`/`MySqlDb` do. Pooling multiple `MssqlDb` handles behind
//! the registry (§4.7) is the caller's responsibility.

use crate::client::Executor;
use crate::dialect::{Dialect, SqlServerDialect};
use crate::error::{DbError, DbResult};
use crate::record::Record;
use crate::row::Row as DbRow;
use crate::transaction::TransactionSource;
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use tiberius::{Client, Query};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::Compat;

type MssqlConn = Client<Compat<TcpStream>>;

fn bind_query<'a>(sql: &'a str, args: &'a [Value]) -> DbResult<Query<'a>> {
    let mut query = Query::new(sql);
    for arg in args {
        match arg {
            Value::Null => query.bind(Option::<i32>::None),
            Value::I64(v) => query.bind(*v),
            Value::F64(v) => query.bind(*v),
            Value::Bool(v) => query.bind(*v),
            Value::Str(v) => query.bind(v.clone()),
            Value::Bytes(v) => query.bind(v.clone()),
            Value::Timestamp(v) => query.bind(v.to_rfc3339()),
            Value::Raw(_) => {
                return Err(DbError::invalid_argument(
                    "a RawValue cannot be bound directly to a SQL Server statement",
                ));
            }
        }
    }
    Ok(query)
}

fn value_from_column(row: &tiberius::Row, idx: usize) -> Value {
    match row.try_get::<&str, usize>(idx) {
        Ok(Some(v)) => return Value::Str(v.to_string()),
        Ok(None) => return Value::Null,
        Err(_) => {}
    }
    if let Ok(Some(v)) = row.try_get::<i64, usize>(idx) {
        return Value::I64(v);
    }
    if let Ok(Some(v)) = row.try_get::<i32, usize>(idx) {
        return Value::I64(v as i64);
    }
    if let Ok(Some(v)) = row.try_get::<f64, usize>(idx) {
        return Value::F64(v);
    }
    if let Ok(Some(v)) = row.try_get::<bool, usize>(idx) {
        return Value::Bool(v);
    }
    if let Ok(Some(v)) = row.try_get::<&[u8], usize>(idx) {
        return Value::Bytes(v.to_vec());
    }
    Value::Null
}

fn row_from_tiberius(row: tiberius::Row) -> DbRow {
    let mut record = Record::new();
    let columns: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    for (idx, name) in columns.into_iter().enumerate() {
        record.set(name, value_from_column(&row, idx));
    }
    DbRow::from_record(record)
}

async fn run_query(conn: &mut MssqlConn, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
    let query = bind_query(sql, args)?;
    let stream = query.query(conn).await?;
    let rows = stream.into_first_result().await?;
    Ok(rows.into_iter().map(row_from_tiberius).collect())
}

async fn run_execute(conn: &mut MssqlConn, sql: &str, args: &[Value]) -> DbResult<u64> {
    let query = bind_query(sql, args)?;
    let result = query.execute(conn).await?;
    Ok(result.rows_affected().iter().sum())
}

/// A registered handle over a single SQL Server connection.
pub struct MssqlDb {
    conn: Arc<Mutex<MssqlConn>>,
}

impl MssqlDb {
    pub fn new(conn: MssqlConn) -> Self {
        Self { conn: Arc::new(Mutex::new(conn)) }
    }
}

#[async_trait]
impl Executor for MssqlDb {
    fn dialect(&self) -> &dyn Dialect {
        &SqlServerDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.conn.lock().await;
        run_query(&mut conn, &native_sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.conn.lock().await;
        run_execute(&mut conn, &native_sql, args).await
    }
}

#[async_trait]
impl TransactionSource for MssqlDb {
    async fn begin(&self) -> DbResult<Arc<dyn Executor>> {
        self.execute("BEGIN TRANSACTION", &[]).await?;
        Ok(Arc::new(MssqlTxExecutor { conn: self.conn.clone() }))
    }

    async fn commit(&self, tx: Arc<dyn Executor>) -> DbResult<()> {
        tx.execute("COMMIT TRANSACTION", &[]).await?;
        Ok(())
    }

    async fn rollback(&self, tx: Arc<dyn Executor>) -> DbResult<()> {
        tx.execute("ROLLBACK TRANSACTION", &[]).await?;
        Ok(())
    }
}

/// The same connection, shared with its parent `MssqlDb` through the `Arc`,
/// flagged `in_transaction()` so a nested `transaction()` call is rejected.
struct MssqlTxExecutor {
    conn: Arc<Mutex<MssqlConn>>,
}

#[async_trait]
impl Executor for MssqlTxExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &SqlServerDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.conn.lock().await;
        run_query(&mut conn, &native_sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.conn.lock().await;
        run_execute(&mut conn, &native_sql, args).await
    }

    fn in_transaction(&self) -> bool {
        true
    }
}
