//! Domain service for authentication.
//!
//! Verifies Basic credentials at login, issues access tokens, and turns
//! bearer tokens back into a [`Principal`].

use serde::Serialize;
use thiserror::Error;

use crate::auth::Principal;
use crate::models::user::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Full authentication is required to access this resource")]
    MissingCredentials,

    #[error("Bad credentials")]
    BadCredentials,

    #[error("User is disabled")]
    AccountDisabled,

    #[error("{0}")]
    InvalidToken(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Login result containing the account and its access token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user_info: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::BadCredentials`] for an unknown user or wrong
    /// password and [`AuthError::AccountDisabled`] for a disabled account.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Validates a bearer token.
    fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}
