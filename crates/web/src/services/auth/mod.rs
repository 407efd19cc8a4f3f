//! Authentication service.
//!
//! Provides password registration and login over the credential store,
//! plus administrator provisioning for startup seeding and the CLI.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use catalog_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::session::CurrentUser;
use crate::models::user::User;

/// Argon2id hash (default parameters) of no real password.
///
/// Verified against when the email is unknown, so both login failure paths
/// cost one hash computation.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$XHTWRU65HY/kxy9ZpOavJQ$htVk0mGL6Rj49V9/F9FFrsK/JObz92e/xe/IHjbnuPU";

/// Authentication service.
///
/// Handles user registration, login, and administrator creation.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// The email is trimmed and lower-cased; the password is trimmed before hashing.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if email or password is blank.
    /// Returns `AuthError::DuplicateEmail` if the email is already registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.create_with_role(email, password, Role::User).await
    }

    /// Create an administrator account.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.create_with_role(email, password, Role::Admin).await
    }

    /// Create the administrator account if it doesn't exist yet.
    ///
    /// Returns `Ok(true)` if a row was inserted, `Ok(false)` if the email was
    /// already taken.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for blank credentials and
    /// `AuthError::Repository` for database failures.
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<bool, AuthError> {
        match self.create_admin(email, password).await {
            Ok(user) => {
                info!(email = %user.email, "Seeded administrator account");
                Ok(true)
            }
            Err(AuthError::DuplicateEmail) => {
                debug!(email = %email.trim().to_lowercase(), "Administrator already present, skipping seed");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// or either is blank.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let password = password.trim();
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some((user, password_hash)) = self.users.get_password_hash(&email).await? else {
            let _ = verify_password(password, DUMMY_PASSWORD_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        Ok(CurrentUser::from(user))
    }

    async fn create_with_role(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let (email, password) = validate_credentials(email, password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&email, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateEmail,
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn validate_credentials<'p>(email: &str, password: &'p str) -> Result<(Email, &'p str), AuthError> {
    let password = password.trim();
    match Email::parse(email) {
        Ok(email) if !password.is_empty() => Ok((email, password)),
        _ => Err(AuthError::Validation(
            "email and password are required".to_string(),
        )),
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
