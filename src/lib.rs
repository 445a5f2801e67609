//! Catalog Access Layer
//!
//! Data access for a small product catalog with user logins, on PostgreSQL.
//! Reads are cached for a short time, writes run in their own transaction,
//! and a missing schema is created on first use together with an admin
//! account and sample products.

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod frame;
pub mod handlers;
pub mod password;
pub mod schema;
pub mod session;
pub mod statement;
pub mod store;
pub mod transaction_aware;
pub mod unit_of_work;
pub mod value;

pub use cache::QueryCache;
pub use config::DbConfig;
pub use error::{CatalogError, CatalogResult};
pub use executor::Executor;
pub use frame::Frame;
pub use password::hash_password;
pub use session::{AuthState, Session};
pub use statement::{CompiledStatement, Statement};
pub use store::CatalogStore;
pub use transaction_aware::TransactionAware;
pub use unit_of_work::{
    PostgresUnitOfWork, PostgresUnitOfWorkSession, UnitOfWork, UnitOfWorkSession,
};
pub use value::Value;
