//! Named handle registry and process-wide `Runtime` singleton (spec §4.7,
//! §9).
//!
//! The teacher is single-handle by construction — a `pgorm::Client` talks to
//! exactly one Postgres connection or pool for the process's lifetime. This
//! spec's multi-handle registry (`register("reports", ...)`, `use_db("reports")`)
//! has no direct teacher analogue, so it's grounded in the wider pack's
//! connection-registry shape (`dbflux_core`'s named-pool map) instead,
//! generalized over [`TransactionSource`] so any backend can be registered
//! under any name.

use crate::client::Executor;
use crate::error::{DbError, DbResult};
use crate::feature::FeatureRegistry;
use crate::transaction::{self, Transaction, TransactionSource};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock, RwLock};

pub const DEFAULT_NAME: &str = "default";

/// A handle the registry can hand back out: anything that is both an
/// [`Executor`] (for plain query/execute calls) and a [`TransactionSource`]
/// (for `transaction(name, ...)`).
pub type DbHandle = Arc<dyn TransactionSource>;

/// Named collection of open `DbHandle`s plus the shared feature registry
/// (spec §9: "an explicit root object" rather than scattered globals).
pub struct Runtime {
    handles: RwLock<HashMap<String, DbHandle>>,
    pub features: FeatureRegistry,
}

impl Runtime {
    fn new() -> Self {
        Self { handles: RwLock::new(HashMap::new()), features: FeatureRegistry::new() }
    }

    pub fn register(&self, name: impl Into<String>, handle: DbHandle) {
        self.handles.write().unwrap_or_else(|e| e.into_inner()).insert(name.into(), handle);
    }

    pub fn use_db(&self, name: &str) -> DbResult<DbHandle> {
        self.handles
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::Connection(format!("no connection registered under '{name}'")))
    }

    pub fn close(&self, name: &str) -> DbResult<()> {
        self.handles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| DbError::Connection(format!("no connection registered under '{name}'")))
    }

    pub fn close_all(&self) {
        self.handles.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// The process-wide singleton backing the free functions below. Lazily
/// built on first use, per spec §9's "explicit root object" resolution of
/// the process-wide-state Open Question.
pub fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(Runtime::new)
}

/// Register `handle` under `name`, making it reachable via [`use_db`] and
/// the default-named convenience path.
pub fn register(name: impl Into<String>, handle: DbHandle) {
    runtime().register(name, handle);
}

/// Register `handle` as the default connection (`"default"`).
pub fn register_default(handle: DbHandle) {
    runtime().register(DEFAULT_NAME, handle);
}

/// Look up a previously registered handle by name.
pub fn use_db(name: &str) -> DbResult<DbHandle> {
    runtime().use_db(name)
}

/// Look up the default (`"default"`-named) handle.
pub fn default_db() -> DbResult<DbHandle> {
    runtime().use_db(DEFAULT_NAME)
}

/// Drop the handle registered under `name`. Existing `Arc` clones (e.g. a
/// builder mid-flight) keep the connection alive until they're dropped too.
pub fn close(name: &str) -> DbResult<()> {
    runtime().close(name)
}

/// Drop every registered handle.
pub fn close_all() {
    runtime().close_all();
}

/// Run `f` inside a transaction opened on the handle registered under
/// `name`. Commits on `Ok`, rolls back on `Err` or panic (see
/// [`crate::transaction::transaction`]).
pub async fn with_transaction<T, F, Fut>(name: &str, f: F) -> DbResult<T>
where
    F: FnOnce(Transaction) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let handle = use_db(name)?;
    transaction::transaction(handle.as_ref(), f).await
}

/// [`with_transaction`] against the default connection.
pub async fn with_default_transaction<T, F, Fut>(f: F) -> DbResult<T>
where
    F: FnOnce(Transaction) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    with_transaction(DEFAULT_NAME, f).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, SqliteDialect};
    use crate::row::Row;
    use crate::value::Value;
    use async_trait::async_trait;

    struct NullDb;

    #[async_trait]
    impl Executor for NullDb {
        fn dialect(&self) -> &dyn Dialect {
            &SqliteDialect
        }

        async fn query(&self, _sql: &str, _args: &[Value]) -> DbResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn execute(&self, _sql: &str, _args: &[Value]) -> DbResult<u64> {
            Ok(0)
        }
    }

    #[async_trait]
    impl TransactionSource for NullDb {
        async fn begin(&self) -> DbResult<Arc<dyn Executor>> {
            Ok(Arc::new(NullDb))
        }

        async fn commit(&self, _tx: Arc<dyn Executor>) -> DbResult<()> {
            Ok(())
        }

        async fn rollback(&self, _tx: Arc<dyn Executor>) -> DbResult<()> {
            Ok(())
        }
    }

    #[test]
    fn unregistered_name_is_an_error() {
        let rt = Runtime::new();
        assert!(rt.use_db("missing").is_err());
    }

    #[test]
    fn register_and_use_round_trips() {
        let rt = Runtime::new();
        rt.register("reports", Arc::new(NullDb));
        assert!(rt.use_db("reports").is_ok());
        rt.close("reports").unwrap();
        assert!(rt.use_db("reports").is_err());
    }

    #[tokio::test]
    async fn with_transaction_commits_against_a_registered_handle() {
        let rt = Runtime::new();
        rt.register("reports", Arc::new(NullDb));
        let handle = rt.use_db("reports").unwrap();
        let result = transaction::transaction(handle.as_ref(), |_tx| async { Ok::<_, DbError>(5) }).await;
        assert_eq!(result.unwrap(), 5);
    }
}
