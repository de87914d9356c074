use serde::Serialize;

use crate::domain::UserId;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Application account without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub enabled: bool,
    /// Space-delimited role names
    pub roles: String,
}

impl User {
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.split_whitespace()
    }
}

#[derive(Debug, Clone)]
pub struct UserInput {
    pub username: String,
    pub password: String,
    pub enabled: bool,
    pub roles: String,
}

/// Mutable account fields. The password is not changed through this path.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub enabled: bool,
    pub roles: String,
}
