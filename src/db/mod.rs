//! Database module
//!
//! This module defines the storage contract the engine relies on and its two
//! backends: an in-process store and the PostgreSQL repositories.

pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod store;

use sqlx::PgPool;

pub use connection::*;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{Store, StoreError, StoreResult, UniqueKey};

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
