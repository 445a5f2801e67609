//! Catalog tables and the one-time seed data.

use rust_decimal::Decimal;

use crate::{hash_password, CatalogResult, Executor, Statement};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_DEFAULT_PASSWORD: &str = "admin123";

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username VARCHAR(50) UNIQUE NOT NULL,
        password_hash VARCHAR(64) NOT NULL,
        is_admin BOOLEAN DEFAULT FALSE,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        category VARCHAR(50),
        price NUMERIC(10, 2) NOT NULL,
        inventory INT DEFAULT 0,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

// PostgreSQL has no ON UPDATE CURRENT_TIMESTAMP; a trigger keeps updated_at fresh.
const CREATE_TOUCH_FUNCTION: &str = r#"
    CREATE OR REPLACE FUNCTION catalog_touch_updated_at() RETURNS TRIGGER AS $$
    BEGIN
        NEW.updated_at = CURRENT_TIMESTAMP;
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql
"#;

const DROP_TOUCH_TRIGGER: &str = "DROP TRIGGER IF EXISTS products_touch_updated_at ON products";

const CREATE_TOUCH_TRIGGER: &str = r#"
    CREATE TRIGGER products_touch_updated_at
    BEFORE UPDATE ON products
    FOR EACH ROW EXECUTE FUNCTION catalog_touch_updated_at()
"#;

/// A product row inserted on first initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleProduct {
    pub name: &'static str,
    pub category: &'static str,
    /// Price in cents.
    pub price_cents: i64,
    pub inventory: i32,
}

impl SampleProduct {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

pub const SAMPLE_PRODUCTS: [SampleProduct; 5] = [
    SampleProduct {
        name: "Laptop",
        category: "Electronics",
        price_cents: 129_999,
        inventory: 10,
    },
    SampleProduct {
        name: "Coffee Maker",
        category: "Appliances",
        price_cents: 8_999,
        inventory: 15,
    },
    SampleProduct {
        name: "Desk Chair",
        category: "Furniture",
        price_cents: 19_999,
        inventory: 5,
    },
    SampleProduct {
        name: "Smartphone",
        category: "Electronics",
        price_cents: 89_999,
        inventory: 20,
    },
    SampleProduct {
        name: "Wireless Headphones",
        category: "Electronics",
        price_cents: 14_999,
        inventory: 30,
    },
];

/// Create the tables if needed and seed them when no admin exists.
///
/// Runs on the caller's transaction. Returns whether seed data was inserted.
/// The admin check is a plain count, so two first-time callers racing each
/// other may both seed.
pub(crate) async fn initialize(executor: &Executor) -> CatalogResult<bool> {
    for ddl in [
        CREATE_USERS_TABLE,
        CREATE_PRODUCTS_TABLE,
        CREATE_TOUCH_FUNCTION,
        DROP_TOUCH_TRIGGER,
        CREATE_TOUCH_TRIGGER,
    ] {
        executor.execute(&Statement::new(ddl)).await?;
    }

    let admins = executor
        .fetch_scalar(&Statement::new(
            "SELECT COUNT(*) FROM users WHERE is_admin = TRUE",
        ))
        .await?;
    if admins > 0 {
        return Ok(false);
    }

    executor
        .execute(
            &Statement::new(
                "INSERT INTO users (username, password_hash, is_admin) \
                 VALUES (:username, :password_hash, TRUE)",
            )
            .bind("username", ADMIN_USERNAME)
            .bind("password_hash", hash_password(ADMIN_DEFAULT_PASSWORD)),
        )
        .await?;

    for product in &SAMPLE_PRODUCTS {
        executor
            .execute(
                &Statement::new(
                    "INSERT INTO products (name, category, price, inventory) \
                     VALUES (:name, :category, :price, :inventory)",
                )
                .bind("name", product.name)
                .bind("category", product.category)
                .bind("price", product.price())
                .bind("inventory", product.inventory),
            )
            .await?;
    }

    Ok(true)
}
