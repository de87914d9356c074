//! Domain service for application user accounts.

use thiserror::Error;

use crate::domain::UserId;
use crate::models::user::{User, UserInput, UserUpdate};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Could not find user with Id {0} :(")]
    NotFound(UserId),

    #[error("username {0} is not found.")]
    UsernameNotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A stored account together with its password hash, for credential checks.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, UserError>;

    async fn find_by_id(&self, id: UserId) -> Result<User, UserError>;

    /// Hashes the plaintext password and stores the new account.
    async fn save(&self, input: UserInput) -> Result<User, UserError>;

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, UserError>;

    async fn delete(&self, id: UserId) -> Result<(), UserError>;

    async fn load_by_username(&self, username: &str) -> Result<StoredCredentials, UserError>;
}
