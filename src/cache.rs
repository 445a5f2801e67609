//! Time-bounded cache of read results.
//!
//! Entries are keyed by the full [`Statement`] (text and bound values) and
//! expire a fixed time after insertion. Nothing here watches the database:
//! whoever writes must clear the cache afterwards, typically by registering
//! it as a [`TransactionAware`] observer on the write's session.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{CatalogResult, Frame, Statement, TransactionAware};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct Entry {
    stored_at: Instant,
    frame: Arc<Frame>,
}

/// Read results shared by every caller of one store.
pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<Statement, Entry>>,
}

impl QueryCache {
    /// Empty cache whose entries expire `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh result for `statement`, evicting it if it has expired.
    pub fn get(&self, statement: &Statement) -> Option<Arc<Frame>> {
        {
            let entries = self.entries.read();
            match entries.get(statement) {
                None => return None,
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.frame.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        if entries
            .get(statement)
            .is_some_and(|entry| entry.stored_at.elapsed() >= self.ttl)
        {
            entries.remove(statement);
        }
        None
    }

    /// Store `frame` for `statement`, purging every expired entry first.
    pub fn insert(&self, statement: Statement, frame: Arc<Frame>) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "Expired query cache entries purged");
        }
        entries.insert(
            statement,
            Entry {
                stored_at: Instant::now(),
                frame,
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "Query cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[async_trait]
impl TransactionAware for QueryCache {
    async fn on_commit(&self) -> CatalogResult<()> {
        self.clear();
        Ok(())
    }

    async fn on_rollback(&self) -> CatalogResult<()> {
        Ok(())
    }
}
