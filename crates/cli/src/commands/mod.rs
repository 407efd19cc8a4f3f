//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use catalog_web::config::{CatalogConfig, ConfigError};
use sqlx::SqlitePool;

/// Load configuration and open a migrated pool.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the database cannot be
/// opened, or migrations fail.
pub async fn connect() -> Result<SqlitePool, ConnectError> {
    let config = CatalogConfig::from_env()?;

    tracing::info!("Connecting to catalog database...");
    let pool = catalog_web::db::create_pool(&config.database_url).await?;
    catalog_web::db::migrate(&pool).await?;

    Ok(pool)
}

/// Errors that can occur while opening the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
