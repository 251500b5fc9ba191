//! Persistence for vibewatch.
//!
//! `models` and `repositories` follow the usual row-struct + zero-sized repo
//! layout over a [`DbPool`]. [`PgVibrationStore`] adapts them to the
//! [`vibewatch_core::store::VibrationStore`] trait; [`MemoryStore`] implements
//! the same trait without a database.

pub mod memory_store;
pub mod models;
pub mod pg_store;
pub mod repositories;

pub use memory_store::MemoryStore;
pub use pg_store::PgVibrationStore;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool is usable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations under `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
