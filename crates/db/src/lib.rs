//! Postgres data layer: pool, migrations, scoped repositories and the
//! Postgres-backed [`AnalyticsSource`](eduscope_core::source::AnalyticsSource).

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod scope_sql;
pub mod source;

pub use source::PgAnalyticsSource;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
