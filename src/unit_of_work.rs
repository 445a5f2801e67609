use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::transaction_aware::{notify_all, Outcome};
use crate::{CatalogResult, Executor, TransactionAware};

/// Factory for all-or-nothing write scopes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Begin a new transaction session.
    async fn begin(&self) -> CatalogResult<Self::Session>;
}

/// One open transaction plus the observers waiting on its outcome.
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync {
    /// Handle for running statements inside this transaction.
    fn executor(&self) -> &Executor;

    /// Register a component to be told whether the transaction committed.
    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>);

    /// Commit, then notify observers.
    async fn commit(self) -> CatalogResult<()>;

    /// Roll back, then notify observers.
    async fn rollback(self) -> CatalogResult<()>;
}

/// Unit of work over the catalog's connection pool.
#[derive(Clone)]
pub struct PostgresUnitOfWork {
    pool: Arc<PgPool>,
}

impl PostgresUnitOfWork {
    /// Wrap a shared pool; each `begin` checks out one connection.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Session = PostgresUnitOfWorkSession;

    async fn begin(&self) -> CatalogResult<Self::Session> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWorkSession::new(tx))
    }
}

/// Session returned by [`PostgresUnitOfWork::begin`].
///
/// Observers are notified in registration order, after the transaction has
/// finished.
pub struct PostgresUnitOfWorkSession {
    executor: Executor,
    observers: RwLock<Vec<Arc<dyn TransactionAware>>>,
}

impl PostgresUnitOfWorkSession {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            executor: Executor::new(tx),
            observers: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresUnitOfWorkSession {
    fn executor(&self) -> &Executor {
        &self.executor
    }

    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>) {
        self.observers.write().push(observer);
    }

    async fn commit(self) -> CatalogResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.commit().await?;

        let observers = self.observers.read().clone();
        notify_all(&observers, Outcome::Committed).await
    }

    async fn rollback(self) -> CatalogResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.rollback().await?;

        let observers = self.observers.read().clone();
        notify_all(&observers, Outcome::RolledBack).await
    }
}
