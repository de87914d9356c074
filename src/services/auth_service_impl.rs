//! Token-based implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task;
use tracing::{info, warn};

use crate::auth::{Principal, TokenProvider};
use crate::db::repositories::user::verify_password;
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::user_service::{UserError, UserService};

pub struct TokenAuthService {
    users: Arc<dyn UserService>,
    tokens: Arc<TokenProvider>,
}

impl TokenAuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserService>, tokens: Arc<TokenProvider>) -> Self {
        Self { users, tokens }
    }
}

#[async_trait]
impl AuthService for TokenAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let credentials = match self.users.load_by_username(username).await {
            Ok(credentials) => credentials,
            Err(UserError::UsernameNotFound(_)) => {
                warn!(username = %username, "Login attempt for unknown user");
                return Err(AuthError::BadCredentials);
            }
            Err(e) => return Err(AuthError::Internal(e.to_string())),
        };

        if !credentials.user.enabled {
            warn!(username = %username, "Login refused: account disabled");
            return Err(AuthError::AccountDisabled);
        }

        let password_hash = credentials.password_hash;
        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || verify_password(&password_hash, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))??;

        if !is_valid {
            warn!(username = %username, "Login failed: wrong password");
            return Err(AuthError::BadCredentials);
        }

        let token = self
            .tokens
            .issue(&credentials.user)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        info!(username = %username, "User logged in");
        Ok(LoginResult {
            user_info: credentials.user,
            token,
        })
    }

    fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens
            .verify(token)
            .map(Principal::from)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
