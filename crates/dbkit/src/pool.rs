//! Connection pool utilities.
//!
//! Only Postgres pools through `deadpool_postgres` here; the pattern doesn't
//! generalize cleanly across backends (`rusqlite` connections aren't
//! poolable the same way, `mysql_async`/`tiberius` have their own pool
//! types). `backend::sqlite::SqliteDb::new`, `backend::mysql::MySqlDb::new`
//! and `backend::mssql::MssqlDb::new` take an already-open connection
//! instead; callers build their own pool around those where pooling makes
//! sense for that engine.

use crate::error::{DbError, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Create a Postgres connection pool from a database URL.
///
/// Convenience helper using `NoTls` and a default pool size of 16. For
/// production, prefer [`create_pool_with_tls`] or
/// [`create_pool_with_manager_config`] to inject TLS/pool tuning.
pub fn create_pool(database_url: &str) -> DbResult<Pool> {
    create_pool_with_config(database_url, 16)
}

/// Create a Postgres connection pool with a custom max size.
pub fn create_pool_with_config(database_url: &str, max_size: usize) -> DbResult<Pool> {
    create_pool_with_manager_config(database_url, NoTls, default_manager_config(), |builder| {
        builder.max_size(max_size)
    })
}

/// Create a Postgres connection pool using a custom TLS connector.
pub fn create_pool_with_tls<T>(database_url: &str, tls: T) -> DbResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    create_pool_with_manager_config(database_url, tls, default_manager_config(), |b| {
        b.max_size(16)
    })
}

/// Create a Postgres connection pool with injected `deadpool_postgres::ManagerConfig`
/// and `PoolBuilder` tuning (timeouts, recycling strategy, max size, etc).
pub fn create_pool_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> DbResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config =
        database_url.parse().map_err(|e: tokio_postgres::Error| DbError::Connection(e.to_string()))?;

    let mgr = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(mgr)).build().map_err(|e| DbError::Connection(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig { recycling_method: RecyclingMethod::Fast }
}
