//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_DATABASE_URL` - SQLite connection string (falls back to
//!   `DATABASE_URL`, then `sqlite://catalog.db`)
//!
//! Migration files live in `crates/web/migrations/` and are embedded into
//! the binary at compile time.

use super::{ConnectError, connect};

/// Apply all pending catalog migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub async fn run() -> Result<(), ConnectError> {
    tracing::info!("Running catalog migrations...");
    let pool = connect().await?;
    pool.close().await;

    tracing::info!("Catalog migrations complete!");
    Ok(())
}
