//! Postgres backend: `deadpool_postgres::Pool` wrapped as a [`crate::client::Executor`].

use crate::client::Executor;
use crate::dialect::{Dialect, PostgresDialect};
use crate::error::{DbError, DbResult};
use crate::row::Row as DbRow;
use crate::transaction::TransactionSource;
use crate::value::Value;
use async_trait::async_trait;
use bytes::BytesMut;
use std::sync::Arc;
use tokio_postgres::types::{IsNull, ToSql, Type};

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::I64(v) => v.to_sql(ty, out),
            Value::F64(v) => v.to_sql(ty, out),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Str(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::Raw(_) => Err("a RawValue cannot be bound directly to a Postgres statement".into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn value_from_row(row: &tokio_postgres::Row, idx: usize) -> DbResult<Value> {
    let column = row.columns()[idx].name().to_string();
    let decode_err = |e: tokio_postgres::Error| DbError::decode(column.clone(), e.to_string());
    match *row.columns()[idx].type_() {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map(|v| v.map_or(Value::Null, Value::Bool)).map_err(decode_err),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx).map(|v| v.map_or(Value::Null, |v| Value::I64(v as i64))).map_err(decode_err),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx).map(|v| v.map_or(Value::Null, |v| Value::I64(v as i64))).map_err(decode_err),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(|v| v.map_or(Value::Null, Value::I64)).map_err(decode_err),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx).map(|v| v.map_or(Value::Null, |v| Value::F64(v as f64))).map_err(decode_err),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map(|v| v.map_or(Value::Null, Value::F64)).map_err(decode_err),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx).map(|v| v.map_or(Value::Null, Value::Bytes)).map_err(decode_err),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map(|v| v.map_or(Value::Null, Value::Timestamp))
            .map_err(decode_err),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
            .map(|v| v.map_or(Value::Null, |v| Value::Timestamp(v.and_utc())))
            .map_err(decode_err),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .map(|v| v.map_or(Value::Null, |v| Value::Str(v.to_string())))
            .map_err(decode_err),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map(|v| v.map_or(Value::Null, |v| Value::Str(v.to_string())))
            .map_err(decode_err),
        // TEXT/VARCHAR/BPCHAR/NAME and anything else not special-cased above:
        // best-effort text decode, matching the teacher's `try_get_column`
        // fallback of trusting the driver's `FromSql<String>` impl.
        _ => row.try_get::<_, Option<String>>(idx).map(|v| v.map_or(Value::Null, Value::Str)).map_err(decode_err),
    }
}

fn row_from_pg(row: tokio_postgres::Row) -> DbResult<DbRow> {
    let mut record = crate::record::Record::new();
    for idx in 0..row.len() {
        let name = row.columns()[idx].name().to_string();
        record.set(name, value_from_row(&row, idx)?);
    }
    Ok(DbRow::from_record(record))
}

fn params_ref(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

/// A registered handle: owns the pool, checks out a connection per call.
pub struct PgDb {
    pool: deadpool_postgres::Pool,
}

impl PgDb {
    pub fn new(pool: deadpool_postgres::Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Executor for PgDb {
    fn dialect(&self) -> &dyn Dialect {
        &PostgresDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let conn = self.pool.get().await.map_err(|e| DbError::Connection(e.to_string()))?;
        let rows = conn.query(&native_sql, &params_ref(args)).await?;
        rows.into_iter().map(row_from_pg).collect()
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let conn = self.pool.get().await.map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(conn.execute(&native_sql, &params_ref(args)).await?)
    }
}

#[async_trait]
impl TransactionSource for PgDb {
    async fn begin(&self) -> DbResult<Arc<dyn Executor>> {
        let conn = self.pool.get().await.map_err(|e| DbError::Connection(e.to_string()))?;
        let exec: Arc<dyn Executor> = Arc::new(PgConnExecutor { conn: Arc::new(conn) });
        exec.execute("BEGIN", &[]).await?;
        Ok(exec)
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

/// A single checked-out connection, held alive for the lifetime of one
/// transaction (or re-used ad hoc by `PgDb` for one-shot calls).
struct PgConnExecutor {
    conn: Arc<deadpool_postgres::Object>,
}

#[async_trait]
impl Executor for PgConnExecutor {
    fn dialect(&self) -> &dyn Dialect {
        &PostgresDialect
    }

    async fn query(&self, sql: &str, args: &[Value]) -> DbResult<Vec<DbRow>> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        let rows = self.conn.query(&native_sql, &params_ref(args)).await?;
        rows.into_iter().map(row_from_pg).collect()
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> DbResult<u64> {
        let native_sql = self.dialect().rewrite_placeholders(sql, args.len())?;
        Ok(self.conn.execute(&native_sql, &params_ref(args)).await?)
    }

    fn in_transaction(&self) -> bool {
        true
    }
}

