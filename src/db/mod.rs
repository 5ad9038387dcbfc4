use sqlx::{Pool, Sqlite, migrate::MigrateDatabase, sqlite::SqlitePoolOptions};
use std::time::Duration;

use crate::error::{AppError, Result};

pub mod payment_store;

pub use payment_store::PaymentStore;

pub type DbPool = Pool<Sqlite>;

pub const PAYMENTS_TABLE: &str = "payments";

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    // Create the database if it doesn't exist
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;
    }

    // Create connection pool
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
        .map_err(|e| AppError::StorageUnavailable(e.to_string()))?;

    ensure_schema(&pool).await?;

    Ok(pool)
}

/// Check whether a table is present in the schema
pub async fn table_exists(pool: &DbPool, table_name: &str) -> Result<bool> {
    let found: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

/// Create the payments table unless it already exists
pub async fn ensure_schema(pool: &DbPool) -> Result<()> {
    if table_exists(pool, PAYMENTS_TABLE).await? {
        tracing::info!("Table '{}' already exists, skipping creation", PAYMENTS_TABLE);
        return Ok(());
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company TEXT NOT NULL,
            amount REAL NOT NULL,
            payment_date TEXT,
            status TEXT NOT NULL CHECK(status IN ('paid', 'unpaid')),
            due_date DATE NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Table '{}' created", PAYMENTS_TABLE);
    Ok(())
}
