use sqlx::{Postgres, Row, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{CatalogError, CatalogResult, Statement};

/// Shared handle to the transaction of one unit-of-work session.
///
/// Cloning is cheap; every clone runs its statements inside the same
/// transaction until the session commits or rolls back.
#[derive(Clone, Debug)]
pub struct Executor {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Run a parameterized statement and return the number of affected rows.
    pub async fn execute(&self, statement: &Statement) -> CatalogResult<u64> {
        let compiled = statement.compile()?;
        let mut tx_guard = self.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(CatalogError::TransactionClosed)?;
        let result = compiled.query().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    /// Run a statement returning one row and read its first column as an integer.
    pub async fn fetch_scalar(&self, statement: &Statement) -> CatalogResult<i64> {
        let compiled = statement.compile()?;
        let mut tx_guard = self.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(CatalogError::TransactionClosed)?;
        let row = compiled.query().fetch_one(&mut **tx).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Takes ownership of the transaction, leaving None in its place.
    /// Only commit and rollback call this.
    pub(crate) async fn take_transaction(&self) -> CatalogResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or(CatalogError::TransactionClosed)
    }
}
