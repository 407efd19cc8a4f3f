//! User repository for database operations.
//!
//! This module is the credential store: it maps a normalized email to a
//! password hash and a role.

use sqlx::SqlitePool;

use catalog_core::{Email, Role, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::user::User;

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    password_hash: String,
    role: Role,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let user = User {
            id: self.id,
            email,
            role: self.role,
        };

        Ok((user, self.password_hash))
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user together with their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, password_hash, role
            FROM users
            WHERE email = ?
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Create a new user with a password hash and role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, password_hash, role)
            VALUES (?, ?, ?)
            RETURNING id, email, password_hash, role
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email"))?;

        let (user, _password_hash) = row.into_user()?;
        Ok(user)
    }

    /// Count users holding the given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_role(&self, role: Role) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = test_pool().await;
        let users = UserRepository::new(&pool);
        let email = Email::parse("shopper@example.com").unwrap();

        let created = users.create(&email, "$argon2id$stub", Role::User).await.unwrap();
        assert_eq!(created.email, email);
        assert_eq!(created.role, Role::User);

        let (found, hash) = users.get_password_hash(&email).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(hash, "$argon2id$stub");
    }

    #[tokio::test]
    async fn test_unknown_email_is_none() {
        let pool = test_pool().await;
        let users = UserRepository::new(&pool);
        let email = Email::parse("ghost@example.com").unwrap();

        assert!(users.get_password_hash(&email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = test_pool().await;
        let users = UserRepository::new(&pool);
        let email = Email::parse("dup@example.com").unwrap();

        users.create(&email, "h1", Role::User).await.unwrap();
        let err = users.create(&email, "h2", Role::Admin).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(users.count_by_role(Role::Admin).await.unwrap(), 0);
    }
}
