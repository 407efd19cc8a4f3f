//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! catalog-cli admin create -e admin@example.com -p 'a long passphrase'
//! ```

use sqlx::SqlitePool;
use thiserror::Error;

use catalog_web::models::User;
use catalog_web::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database could not be opened.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Email or password missing.
    #[error("Email and password are required")]
    MissingCredentials,

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    /// Any other authentication failure.
    #[error("Failed to create admin: {0}")]
    Auth(AuthError),
}

/// Create a new administrator.
///
/// # Errors
///
/// Returns `AdminError::UserExists` if the email is taken.
pub async fn create_user(email: &str, password: &str) -> Result<User, AdminError> {
    let pool = connect().await?;
    let user = create_user_in(&pool, email, password).await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user)
}

/// Create a new administrator in an already opened database.
///
/// # Errors
///
/// Returns `AdminError::UserExists` if the email is taken.
pub async fn create_user_in(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<User, AdminError> {
    AuthService::new(pool)
        .create_admin(email, password)
        .await
        .map_err(|e| match e {
            AuthError::Validation(_) => AdminError::MissingCredentials,
            AuthError::DuplicateEmail => AdminError::UserExists(email.trim().to_lowercase()),
            other => AdminError::Auth(other),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use catalog_core::Role;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        catalog_web::db::migrate(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_admin_then_duplicate() {
        let pool = memory_pool().await;

        let user = create_user_in(&pool, "Ops@Example.com", "pw").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email.as_str(), "ops@example.com");

        let err = create_user_in(&pool, "ops@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AdminError::UserExists(ref email) if email == "ops@example.com"));
    }

    #[tokio::test]
    async fn test_blank_password_is_rejected() {
        let pool = memory_pool().await;

        let err = create_user_in(&pool, "ops@example.com", "  ").await.unwrap_err();
        assert!(matches!(err, AdminError::MissingCredentials));
    }
}
