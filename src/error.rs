/// SQLSTATE PostgreSQL reports for a reference to a table that does not exist.
const UNDEFINED_TABLE: &str = "42P01";

/// Errors raised by the catalog access layer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Table does not exist: {0}")]
    SchemaMissing(String),

    #[error("Query execution error: {0}")]
    Query(String),

    /// Schema initialization, attempted after a missing table, failed too.
    #[error("Database initialization error: {0}")]
    Initialization(#[source] Box<CatalogError>),

    #[error("Transaction already finished")]
    TransactionClosed,
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// True when the failure was a missing table, which triggers schema
    /// initialization and a single retry.
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, CatalogError::SchemaMissing(_))
    }

    /// True when the database could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, CatalogError::Connection(_))
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(UNDEFINED_TABLE) {
                return CatalogError::SchemaMissing(db.message().to_string());
            }
        }

        match &err {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => CatalogError::Connection(err.to_string()),
            _ => CatalogError::Query(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_connection_errors() {
        let err = CatalogError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_connection());
        assert!(!err.is_schema_missing());
    }

    #[test]
    fn decode_failures_are_query_errors() {
        let err = CatalogError::from(sqlx::Error::ColumnNotFound("price".into()));
        assert!(matches!(err, CatalogError::Query(_)));
    }

    #[test]
    fn initialization_failure_keeps_its_cause() {
        use std::error::Error as _;

        let err = CatalogError::Initialization(Box::new(CatalogError::Query(
            "column \"is_admin\" does not exist".into(),
        )));
        assert_eq!(
            err.to_string(),
            "Database initialization error: Query execution error: column \"is_admin\" does not exist"
        );
        assert!(err.source().is_some());
        assert!(!err.is_schema_missing());
    }

    #[test]
    fn display_matches_user_facing_wording() {
        let err = CatalogError::Query("syntax error".into());
        assert_eq!(err.to_string(), "Query execution error: syntax error");
    }
}
