//! Transaction executor
//!
//! Every core operation runs inside [`TxManager::execute`]: one Postgres transaction,
//! committed when the operation returns `Ok`, rolled back when it returns `Err` or
//! panics. If the returned future is dropped before completion (the caller's request
//! was cancelled), the open `sqlx::Transaction` is dropped with it and Postgres rolls
//! the work back; nothing is committed partially.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::{PgConnection, Pool, Postgres};
use tokio::sync::Mutex;

use crate::error::AppResult;

/// Row lock taken by a locked read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    /// `FOR UPDATE`: the row will be written in this transaction
    Update,
    /// `FOR SHARE`: the row must not change until commit
    Share,
}

impl RowLock {
    pub fn clause(&self) -> &'static str {
        match self {
            RowLock::Update => "FOR UPDATE",
            RowLock::Share => "FOR SHARE",
        }
    }
}

#[derive(Clone)]
pub struct TxManager {
    pool: Pool<Postgres>,
    /// Process-wide critical section, only present when configured
    serial: Option<Arc<Mutex<()>>>,
}

impl TxManager {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool, serial: None }
    }

    /// Hold one process-wide lock from begin to commit.
    /// Every transaction of this manager then runs strictly one at a time.
    pub fn serialized(mut self) -> Self {
        self.serial = Some(Arc::new(Mutex::new(())));
        self
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Run `op` in a single transaction.
    ///
    /// `op` receives the transaction's connection; every query it issues joins the
    /// transaction. Owned arguments should be moved into the closure, since the
    /// returned future borrows only the connection.
    pub async fn execute<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, AppResult<T>> + Send,
    {
        let _guard = match &self.serial {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let outcome = AssertUnwindSafe(op(&mut *tx)).catch_unwind().await;

        match outcome {
            Ok(Ok(value)) => {
                tx.commit().await?;
                Ok(value)
            }
            Ok(Err(err)) => {
                // The operation's error wins over a failed rollback
                let _ = tx.rollback().await;
                Err(err)
            }
            Err(panic) => {
                let _ = tx.rollback().await;
                std::panic::resume_unwind(panic)
            }
        }
    }
}
