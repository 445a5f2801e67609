//! The catalog access layer.
//!
//! [`CatalogStore`] owns the connection pool and the read cache. Reads go
//! through the cache; writes run in their own unit-of-work transaction.
//! Both recover from a missing table by initializing the schema and
//! retrying once.
//!
//! Writes never clear the cache on their own. Every caller that writes must
//! invalidate afterwards, either by calling [`CatalogStore::clear_cache`] or
//! by passing [`CatalogStore::cache`] to
//! [`CatalogStore::execute_query_notifying`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::{Column, Executor as _, PgPool};

use crate::cache::{QueryCache, DEFAULT_TTL};
use crate::config::{self, DbConfig};
use crate::{
    hash_password, schema, CatalogError, CatalogResult, Frame, PostgresUnitOfWork, Statement,
    TransactionAware, UnitOfWork, UnitOfWorkSession,
};

/// Process-wide access to the catalog database.
///
/// Build one at start-up and share it by reference; it holds the pool, the
/// unit of work used for writes and the read cache.
pub struct CatalogStore {
    pool: Arc<PgPool>,
    uow: PostgresUnitOfWork,
    cache: Arc<QueryCache>,
}

impl CatalogStore {
    /// Creates a store over an existing pool with the default cache lifetime.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_cache_ttl(pool, DEFAULT_TTL)
    }

    /// Creates a store whose cached reads live for `ttl`.
    pub fn with_cache_ttl(pool: Arc<PgPool>, ttl: Duration) -> Self {
        Self {
            uow: PostgresUnitOfWork::new(pool.clone()),
            cache: Arc::new(QueryCache::new(ttl)),
            pool,
        }
    }

    /// Open the pool described by `config` and build a store on it.
    pub async fn connect(config: &DbConfig) -> CatalogResult<Self> {
        let pool = config::connect(config).await?;
        Ok(Self::with_cache_ttl(Arc::new(pool), config.cache_ttl))
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The read cache, for registering as a write observer.
    pub fn cache(&self) -> Arc<QueryCache> {
        self.cache.clone()
    }

    /// Drop every cached read. Call after any successful write.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Create missing tables and seed the admin account and sample products.
    ///
    /// Safe to call repeatedly: seeding only happens while no admin exists.
    pub async fn initialize_database(&self) -> CatalogResult<()> {
        let session = self.uow.begin().await?;
        match schema::initialize(session.executor()).await {
            Ok(seeded) => {
                session.commit().await?;
                tracing::info!(seeded, "Database schema initialized");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed initialization failed");
                }
                tracing::error!(error = %err, "Database initialization error");
                Err(err)
            }
        }
    }

    /// Run a read, serving identical statements from the cache until they expire.
    pub async fn run_query(&self, statement: &Statement) -> CatalogResult<Arc<Frame>> {
        if let Some(frame) = self.cache.get(statement) {
            tracing::debug!(sql = statement.sql(), "Query cache hit");
            return Ok(frame);
        }

        tracing::debug!(sql = statement.sql(), "Query cache miss");
        let frame = Arc::new(self.with_schema_retry(|| self.fetch(statement)).await?);
        self.cache.insert(statement.clone(), frame.clone());
        Ok(frame)
    }

    /// Run a write in its own transaction.
    pub async fn execute_query(&self, statement: &Statement) -> CatalogResult<()> {
        self.execute_query_notifying(statement, &[]).await
    }

    /// Run a write and notify `observers` once its transaction finishes.
    pub async fn execute_query_notifying(
        &self,
        statement: &Statement,
        observers: &[Arc<dyn TransactionAware>],
    ) -> CatalogResult<()> {
        self.with_schema_retry(|| self.write(statement, observers))
            .await
    }

    /// True iff exactly one user has this name and password digest.
    ///
    /// A failed lookup counts as a mismatch. Use [`CatalogStore::check_password`]
    /// to see why the lookup failed.
    pub async fn verify_password(&self, username: &str, password: &str) -> bool {
        self.check_password(username, password)
            .await
            .unwrap_or(false)
    }

    /// Look up the user by name and password digest.
    ///
    /// `Ok(true)` iff exactly one row matches; lookup failures are returned
    /// as errors instead of being folded into a mismatch.
    pub async fn check_password(&self, username: &str, password: &str) -> CatalogResult<bool> {
        let statement = Statement::new(
            "SELECT * FROM users WHERE username = :username AND password_hash = :password_hash",
        )
        .bind("username", username)
        .bind("password_hash", hash_password(password));

        match self.run_query(&statement).await {
            Ok(frame) => Ok(frame.len() == 1),
            Err(err) => {
                tracing::warn!(error = %err, username, "Password lookup failed");
                Err(err)
            }
        }
    }

    async fn fetch(&self, statement: &Statement) -> CatalogResult<Frame> {
        let compiled = statement.compile()?;
        let rows = compiled.query().fetch_all(&*self.pool).await?;

        let columns = if rows.is_empty() {
            let described = self.pool.describe(&compiled.sql).await?;
            described
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect()
        } else {
            Vec::new()
        };

        Ok(Frame::from_pg_rows(columns, &rows)?)
    }

    async fn write(
        &self,
        statement: &Statement,
        observers: &[Arc<dyn TransactionAware>],
    ) -> CatalogResult<()> {
        let session = self.uow.begin().await?;
        for observer in observers {
            session.register_transaction_aware(observer.clone());
        }

        match session.executor().execute(statement).await {
            Ok(rows_affected) => {
                session.commit().await?;
                tracing::info!(rows_affected, sql = statement.sql(), "Write committed");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed write failed");
                }
                Err(err)
            }
        }
    }

    /// Run `op`; if it fails because a table is missing, initialize the
    /// schema and run it exactly once more.
    async fn with_schema_retry<T, F, Fut>(&self, op: F) -> CatalogResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = CatalogResult<T>>,
    {
        match op().await {
            Ok(value) => Ok(value),
            Err(err) if err.is_schema_missing() => {
                tracing::warn!(error = %err, "Table missing, initializing schema and retrying");
                if let Err(init_err) = self.initialize_database().await {
                    tracing::error!(error = %init_err, cause = %err, "Schema initialization failed during retry");
                    return Err(CatalogError::Initialization(Box::new(init_err)));
                }
                op().await.inspect_err(|retry_err| {
                    tracing::error!(error = %retry_err, "Query failed after schema initialization");
                })
            }
            Err(err) => {
                tracing::error!(error = %err, "Query execution error");
                Err(err)
            }
        }
    }
}
