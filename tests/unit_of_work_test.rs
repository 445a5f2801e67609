mod common;

use catalog_access::{
    CatalogError, CatalogStore, Frame, PostgresUnitOfWork, QueryCache, Statement, UnitOfWork,
    UnitOfWorkSession, Value,
};
use rust_decimal::Decimal;
use std::sync::Arc;

use common::{cleanup_database, count, fresh_database, RecordingObserver};

fn insert_lamp() -> Statement {
    Statement::new(
        "INSERT INTO products (name, category, price, inventory) \
         VALUES (:name, :category, :price, :inventory)",
    )
    .bind("name", "Desk Lamp")
    .bind("category", "Furniture")
    .bind("price", Decimal::new(3999, 2))
    .bind("inventory", 12)
}

fn warm_cache() -> Arc<QueryCache> {
    let cache = Arc::new(QueryCache::default());
    cache.insert(
        Statement::new("SELECT * FROM products"),
        Arc::new(
            Frame::new(vec!["name".into()], vec![vec![Value::from("Laptop")]])
                .expect("Failed to build frame"),
        ),
    );
    cache
}

const LAMPS: &str = "SELECT COUNT(*) FROM products WHERE name = 'Desk Lamp'";

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_commit_notifies_observers_and_persists() {
    // Setup
    let pool = fresh_database().await;
    let store = CatalogStore::new(Arc::new(pool.clone()));
    store
        .initialize_database()
        .await
        .expect("Failed to initialize schema");
    let uow = PostgresUnitOfWork::new(Arc::new(pool.clone()));

    let session = uow.begin().await.expect("Failed to begin transaction");
    let recorder = RecordingObserver::new();
    let cache = warm_cache();
    session.register_transaction_aware(recorder.clone());
    session.register_transaction_aware(cache.clone());

    let affected = session
        .executor()
        .execute(&insert_lamp())
        .await
        .expect("Failed to insert product");
    assert_eq!(affected, 1);

    // Visible inside the transaction
    let inside = session
        .executor()
        .fetch_scalar(&Statement::new(LAMPS))
        .await
        .expect("Failed to count inside transaction");
    assert_eq!(inside, 1);

    session.commit().await.expect("Failed to commit transaction");

    assert!(recorder.is_committed(), "Observer should see the commit");
    assert!(!recorder.is_rolled_back(), "Observer should not see a rollback");
    assert!(cache.is_empty(), "Commit should clear the read cache");
    assert_eq!(count(&pool, LAMPS).await, 1);

    // Cleanup
    cleanup_database(&pool).await;
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_rollback_discards_writes_and_keeps_cache() {
    // Setup
    let pool = fresh_database().await;
    let store = CatalogStore::new(Arc::new(pool.clone()));
    store
        .initialize_database()
        .await
        .expect("Failed to initialize schema");
    let uow = PostgresUnitOfWork::new(Arc::new(pool.clone()));
    let initial = count(&pool, "SELECT COUNT(*) FROM products").await;

    let session = uow.begin().await.expect("Failed to begin transaction");
    let recorder = RecordingObserver::new();
    let cache = warm_cache();
    session.register_transaction_aware(recorder.clone());
    session.register_transaction_aware(cache.clone());

    session
        .executor()
        .execute(&insert_lamp())
        .await
        .expect("Failed to insert product");

    session
        .rollback()
        .await
        .expect("Failed to rollback transaction");

    assert!(!recorder.is_committed(), "Observer should not see a commit");
    assert!(recorder.is_rolled_back(), "Observer should see the rollback");
    assert_eq!(cache.len(), 1, "Rollback leaves cached reads alone");
    assert_eq!(count(&pool, LAMPS).await, 0);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, initial);

    // Cleanup
    cleanup_database(&pool).await;
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_executor_is_unusable_after_commit() {
    // Setup
    let pool = fresh_database().await;
    let store = CatalogStore::new(Arc::new(pool.clone()));
    store
        .initialize_database()
        .await
        .expect("Failed to initialize schema");
    let uow = PostgresUnitOfWork::new(Arc::new(pool.clone()));

    let session = uow.begin().await.expect("Failed to begin transaction");
    let executor = session.executor().clone();
    session.commit().await.expect("Failed to commit empty transaction");

    let err = executor
        .execute(&insert_lamp())
        .await
        .expect_err("Executor should be closed after commit");
    assert!(matches!(err, CatalogError::TransactionClosed));
    assert_eq!(count(&pool, LAMPS).await, 0);

    // Cleanup
    cleanup_database(&pool).await;
    pool.close().await;
}
