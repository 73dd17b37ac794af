//! Database connection management

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let url = config.require_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Test database connection
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
