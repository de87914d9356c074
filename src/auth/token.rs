//! Signed access tokens.
//!
//! Tokens are EdDSA-signed JWTs. The Ed25519 key pair lives only in memory,
//! so every restart invalidates previously issued tokens.

use chrono::{Duration, Utc};
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::domain::UserId;
use crate::models::user::User;

const ROLE_PREFIX: &str = "ROLE_";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to create signing key: {0}")]
    Key(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub sub: String,
    /// Space-delimited `ROLE_<name>` entries
    pub authorities: String,
    #[serde(rename = "userId")]
    pub user_id: i32,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<String>,
}

impl Principal {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        let roles = claims
            .authorities
            .split_whitespace()
            .map(|a| a.strip_prefix(ROLE_PREFIX).unwrap_or(a).to_string())
            .collect();

        Self {
            user_id: UserId::new(claims.user_id),
            username: claims.sub,
            roles,
        }
    }
}

pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenProvider {
    /// Creates a provider with a freshly generated key pair.
    pub fn generate(config: &SecurityConfig) -> Result<Self, TokenError> {
        let secret: [u8; 32] = rand::rng().random();
        let signing_key = SigningKey::from_bytes(&secret);

        let pkcs8 = signing_key
            .to_pkcs8_der()
            .map_err(|e| TokenError::Key(e.to_string()))?;

        Ok(Self {
            encoding: EncodingKey::from_ed_der(pkcs8.as_bytes()),
            decoding: DecodingKey::from_ed_der(signing_key.verifying_key().as_bytes()),
            issuer: config.token_issuer.clone(),
            ttl: Duration::hours(i64::from(config.token_ttl_hours)),
        })
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    fn issue_at(&self, user: &User, issued_at: i64) -> Result<String, TokenError> {
        let authorities = user
            .role_names()
            .map(|r| format!("{ROLE_PREFIX}{r}"))
            .collect::<Vec<_>>()
            .join(" ");

        let claims = Claims {
            iss: self.issuer.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
            sub: user.username.clone(),
            authorities,
            user_id: user.id.value(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Checks signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TokenProvider {
        TokenProvider::generate(&SecurityConfig::default()).unwrap()
    }

    fn john() -> User {
        User {
            id: UserId::new(1),
            username: "john".to_string(),
            enabled: true,
            roles: "admin user".to_string(),
        }
    }

    #[test]
    fn issued_token_carries_identity_and_roles() {
        let tokens = provider();
        let token = tokens.issue(&john()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.iss, "self");
        assert_eq!(claims.sub, "john");
        assert_eq!(claims.authorities, "ROLE_admin ROLE_user");
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.exp - claims.iat, 2 * 60 * 60);

        let principal = Principal::from(claims);
        assert!(principal.has_role("admin"));
        assert!(principal.has_role("user"));
        assert_eq!(principal.user_id, UserId::new(1));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = provider();
        let three_hours_ago = Utc::now().timestamp() - 3 * 60 * 60;
        let token = tokens.issue_at(&john(), three_hours_ago).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let token = provider().issue(&john()).unwrap();
        assert!(provider().verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(provider().verify("not.a.token").is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let other = TokenProvider::generate(&SecurityConfig {
            token_issuer: "elsewhere".to_string(),
            ..SecurityConfig::default()
        })
        .unwrap();
        let tokens = TokenProvider {
            encoding: other.encoding.clone(),
            decoding: other.decoding.clone(),
            issuer: "self".to_string(),
            ttl: other.ttl,
        };

        let token = other.issue(&john()).unwrap();
        assert!(tokens.verify(&token).is_err());
    }
}
