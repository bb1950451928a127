//! MySQL backend: `mysql_async::Pool` wrapped as a [`crate::client::Executor`].

use crate::client::Executor;
use crate::dialect::{Dialect, MySqlDialect};
use crate::error::DbResult;
use crate::record::Record;
use crate::row::Row as DbRow;
use crate::transaction::TransactionSource;
use crate::value::Value;
use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use std::sync::Arc;

impl From<Value> for mysql_async::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => mysql_async::Value::NULL,
            Value::I64(v) => mysql_async::Value::Int(v),
            Value::F64(v) => mysql_async::Value::Double(v),
            Value::Bool(v) => mysql_async::Value::Int(v as i64),
            Value::Str(v) => mysql_async::Value::Bytes(v.into_bytes()),
            Value::Bytes(v) => mysql_async::Value::Bytes(v),
            Value::Timestamp(v) => mysql_async::Value::Bytes(v.to_rfc3339().into_bytes()),
            Value::Raw(_) => mysql_async::Value::NULL,
        }
    }
}

fn value_from_mysql(v: &mysql_async::Value) -> Value {
    match v {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Int(i) => Value::I64(*i),
        mysql_async::Value::UInt(u) => Value::I64(*u as i64),
        mysql_async::Value::Float(f) => Value::F64(*f as f64),
        mysql_async::Value::Double(f) => Value::F64(*f),
        mysql_async::Value::Bytes(b) => {
            String::from_utf8(b.clone()).map(Value::Str).unwrap_or_else(|_| Value::Bytes(b.clone()))
        }
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            Value::Str(format!("{year:04}-{month:02}-{day:02} {hour:02}:{min:02}:{sec:02}.{micro:06}"))
        }
        mysql_async::Value::Time(neg, days, hour, min, sec, micro) => {
            let sign = if *neg { "-" } else { "" };
            Value::Str(format!("{sign}{days}d{hour:02}:{min:02}:{sec:02}.{micro:06}"))
        }
    }
}

fn params_from(args: &[Value]) -> mysql_async::Params {
    mysql_async::Params::Positional(args.iter().cloned().map(Into::into).collect())
}

async fn run_query(conn: &mut mysql_async::Conn, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
    let rows: Vec<mysql_async::Row> = conn.exec(sql, params_from(args)).await?;
    rows.into_iter()
        .map(|row| {
            let mut record = Record::new();
            for (idx, col) in row.columns_ref().iter().enumerate() {
                let name = col.name_str().into_owned();
                let value = row.as_ref(idx).map(value_from_mysql).unwrap_or(Value::Null);
                record.set(name, value);
            }
            Ok(DbRow::from_record(record))
        })
        .collect()
}

/// A registered handle: owns the pool, checks out a connection per call.
pub struct MySqlDb {
    pool: mysql_async::Pool,
}

impl MySqlDb {
    pub fn new(pool: mysql_async::Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Executor for MySqlDb {
    fn dialect(&self) -> &dyn Dialect {
        &MySqlDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.pool.get_conn().await?;
        run_query(&mut conn, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.pool.get_conn().await?;
        conn.exec_drop(sql, params_from(args)).await?;
        Ok(conn.affected_rows())
    }
}

#[async_trait]
impl TransactionSource for MySqlDb {
    async fn begin(&self) -> DbResult<Arc<dyn Executor>> {
        let mut conn = self.pool.get_conn().await?;
        conn.query_drop("BEGIN").await?;
        Ok(Arc::new(MySqlConnExecutor { conn: tokio::sync::Mutex::new(conn) }))
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

/// A single checked-out connection held for one transaction's lifetime.
/// `mysql_async::Conn` is `!Sync`, so access is serialized through a
/// `tokio::sync::Mutex`.
struct MySqlConnExecutor {
    conn: tokio::sync::Mutex<mysql_async::Conn>,
}

#[async_trait]
impl Executor for MySqlConnExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &MySqlDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.conn.lock().await;
        run_query(&mut conn, sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        self.dialect().rewrite_placeholders(sql, args.len())?;
        let mut conn = self.conn.lock().await;
        conn.exec_drop(sql, params_from(args)).await?;
        Ok(conn.affected_rows())
    }

    fn in_transaction(&self) -> bool {
        true
    }
}
