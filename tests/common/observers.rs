use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use catalog_access::{CatalogResult, TransactionAware};

/// Observer that remembers which transaction outcome it was told about
pub struct RecordingObserver {
    committed: RwLock<bool>,
    rolled_back: RwLock<bool>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            committed: RwLock::new(false),
            rolled_back: RwLock::new(false),
        })
    }

    pub fn is_committed(&self) -> bool {
        *self.committed.read()
    }

    pub fn is_rolled_back(&self) -> bool {
        *self.rolled_back.read()
    }
}

#[async_trait]
impl TransactionAware for RecordingObserver {
    async fn on_commit(&self) -> CatalogResult<()> {
        *self.committed.write() = true;
        Ok(())
    }

    async fn on_rollback(&self) -> CatalogResult<()> {
        *self.rolled_back.write() = true;
        Ok(())
    }
}
