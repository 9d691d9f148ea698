//! # User Repository
//!
//! Accounts, authentication, and admin-side user management.
//!
//! ## Authentication
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Login Flow                                        │
//! │                                                                         │
//! │  authenticate(username, password)                                       │
//! │       │                                                                 │
//! │       ├── unknown username        ──► Ok(None)                          │
//! │       ├── argon2 verify fails     ──► Ok(None)                          │
//! │       ├── account deactivated     ──► Ok(None)                          │
//! │       └── otherwise               ──► Ok(Some(user))                    │
//! │                                                                         │
//! │  All failure modes collapse to None so the shell shows one opaque       │
//! │  "Invalid username or password" message.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Passwords are stored as argon2id PHC strings, never in plaintext.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use usms_core::{Role, User, UserStatus};

const USER_COLUMNS: &str = "id, username, password_hash, role, status, created_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    // =========================================================================
    // Registration & Authentication
    // =========================================================================

    /// Registers a new account with the given role.
    ///
    /// Self-registration always passes [`Role::User`]; admins pass any role.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already taken
    pub async fn register(&self, username: &str, password: &str, role: Role) -> DbResult<User> {
        let username = username.trim();
        debug!(username = %username, role = %role, "Registering user");

        let password_hash = hash_password(password)?;
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO users (username, password_hash, role, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role)
        .bind(UserStatus::Active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", username),
            other => other,
        })?
        .last_insert_rowid();

        Ok(User {
            id,
            username: username.to_string(),
            password_hash,
            role,
            status: UserStatus::Active,
            created_at: now,
        })
    }

    /// Verifies credentials and returns the account on success.
    ///
    /// Returns `Ok(None)` for every failure mode (unknown username, wrong
    /// password, deactivated account) so callers can't distinguish them.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let username = username.trim();

        let user = match self.get_by_username(username).await? {
            Some(user) => user,
            None => {
                debug!(username = %username, "Login attempt for unknown username");
                return Ok(None);
            }
        };

        if !verify_password(&user.password_hash, password) {
            warn!(username = %username, "Failed login attempt");
            return Ok(None);
        }

        if !user.is_active() {
            warn!(username = %username, "Login attempt on deactivated account");
            return Ok(None);
        }

        debug!(username = %username, role = %user.role, "Login successful");
        Ok(Some(user))
    }

    /// Re-checks a known user's password. Used by the admin edit screen,
    /// which requires the admin's own password before applying changes.
    pub fn verify(&self, user: &User, password: &str) -> bool {
        verify_password(&user.password_hash, password)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Gets a user by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by username (any status).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Lists every account, active and deactivated, for the admin screen.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // =========================================================================
    // Admin Management
    // =========================================================================

    /// Updates an account. `None` keeps the current value; a new password
    /// is rehashed before storage.
    pub async fn update(
        &self,
        id: i64,
        username: Option<&str>,
        password: Option<&str>,
        role: Option<Role>,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating user");

        let password_hash = match password {
            Some(p) => Some(hash_password(p)?),
            None => None,
        };

        let result = sqlx::query(
            "UPDATE users SET \
                 username = COALESCE(?2, username), \
                 password_hash = COALESCE(?3, password_hash), \
                 role = COALESCE(?4, role) \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(username.map(str::trim))
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DbError::duplicate("username", username.unwrap_or_default())
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }

        Ok(())
    }

    /// Deactivates an active account. The caller enforces that admins
    /// cannot deactivate themselves.
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Deactivating user");

        let result = sqlx::query("UPDATE users SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(UserStatus::Deactivated)
            .bind(UserStatus::Active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Active user", id.to_string()));
        }

        Ok(())
    }

    /// Restores a deactivated account to active.
    pub async fn recover(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Recovering user");

        let result = sqlx::query("UPDATE users SET status = ?2 WHERE id = ?1 AND status = ?3")
            .bind(id)
            .bind(UserStatus::Active)
            .bind(UserStatus::Deactivated)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Deactivated user", id.to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password into an argon2id PHC string with a fresh salt.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
///
/// A malformed stored hash verifies as false rather than erroring; the
/// account is simply unusable until an admin resets the password.
fn verify_password(stored: &str, password: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            warn!("Stored password hash is malformed");
            false
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.register("maria", "hunter2hunter2", Role::User).await.unwrap();
        assert_ne!(user.password_hash, "hunter2hunter2");
        assert!(user.password_hash.starts_with("$argon2"));

        let found = repo.authenticate("maria", "hunter2hunter2").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);

        // Wrong password and unknown username both collapse to None
        assert!(repo.authenticate("maria", "wrong-password").await.unwrap().is_none());
        assert!(repo.authenticate("nobody", "hunter2hunter2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        let repo = db.users();

        repo.register("maria", "hunter2hunter2", Role::User).await.unwrap();
        let err = repo
            .register("maria", "another-password", Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivated_account_cannot_login() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.register("maria", "hunter2hunter2", Role::User).await.unwrap();
        repo.deactivate(user.id).await.unwrap();

        assert!(repo.authenticate("maria", "hunter2hunter2").await.unwrap().is_none());

        // Deactivating twice fails: no longer active
        assert!(matches!(
            repo.deactivate(user.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));

        repo.recover(user.id).await.unwrap();
        assert!(repo.authenticate("maria", "hunter2hunter2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields_and_rehashes_password() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo.register("maria", "hunter2hunter2", Role::User).await.unwrap();

        repo.update(user.id, None, Some("new-password-123"), Some(Role::SalesManager))
            .await
            .unwrap();

        let updated = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(updated.username, "maria");
        assert_eq!(updated.role, Role::SalesManager);
        assert!(repo.authenticate("maria", "new-password-123").await.unwrap().is_some());
        assert!(repo.authenticate("maria", "hunter2hunter2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_checks_own_password() {
        let db = test_db().await;
        let repo = db.users();

        let admin = repo.register("admin", "correct-horse-battery", Role::Admin).await.unwrap();
        assert!(repo.verify(&admin, "correct-horse-battery"));
        assert!(!repo.verify(&admin, "staple"));
    }
}
