use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{User, UserRole, UserSummary};
use crate::store::{NewUser, Store};

/// User directory: account creation, credential checks, and role lookups.
/// Passwords are stored as salted Argon2id hashes and compared through the
/// verifier, never as plaintext.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
            .to_string();

        let user = self
            .store
            .insert_user(&NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, role = ?user.role, "user created");
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Check credentials and return the account's identity, or `None` when
    /// the username is unknown or the password does not verify.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserSummary>, AppError> {
        let Some(user) = self.store.user_by_username(username).await? else {
            return Ok(None);
        };

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {e}"))?;

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
        {
            Ok(Some(user.summary()))
        } else {
            Ok(None)
        }
    }

    /// Minimal projections of every approver account, for assigning a
    /// request to someone who can decide it.
    pub async fn approvers(&self) -> Result<Vec<UserSummary>, AppError> {
        Ok(self.store.users_by_role(UserRole::Approver).await?)
    }
}
