use async_trait::async_trait;
use std::sync::Arc;

use crate::CatalogResult;

/// Component notified once a unit-of-work session finishes.
///
/// Writers register observers on the session that performs the write; the
/// read cache is the main one, clearing itself when a write commits.
#[async_trait]
pub trait TransactionAware: Send + Sync {
    /// Called after the transaction committed.
    async fn on_commit(&self) -> CatalogResult<()>;

    /// Called after the transaction rolled back.
    async fn on_rollback(&self) -> CatalogResult<()>;
}

/// Outcome an observer is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Committed,
    RolledBack,
}

/// Notify observers in registration order, stopping at the first failure.
pub(crate) async fn notify_all(
    observers: &[Arc<dyn TransactionAware>],
    outcome: Outcome,
) -> CatalogResult<()> {
    for observer in observers {
        match outcome {
            Outcome::Committed => observer.on_commit().await?,
            Outcome::RolledBack => observer.on_rollback().await?,
        }
    }
    Ok(())
}
