//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::domain::UserId;
use crate::models::user::{User, UserInput, UserUpdate};
use crate::services::user_service::{StoredCredentials, UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn find_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.store.list_users().await?)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, UserError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn save(&self, input: UserInput) -> Result<User, UserError> {
        let user = self.store.add_user(input, &self.security).await?;
        info!(id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, UserError> {
        self.store
            .update_user(id, update)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn delete(&self, id: UserId) -> Result<(), UserError> {
        if !self.store.remove_user(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!(id = %id, "User deleted");
        Ok(())
    }

    async fn load_by_username(&self, username: &str) -> Result<StoredCredentials, UserError> {
        let (user, password_hash) = self
            .store
            .get_user_by_username_with_password(username)
            .await?
            .ok_or_else(|| UserError::UsernameNotFound(username.to_string()))?;

        Ok(StoredCredentials {
            user,
            password_hash,
        })
    }
}
