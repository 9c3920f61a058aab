//! Bearer token → user identity.
//!
//! Tokens are issued by the account service; this side only looks up the SHA-256
//! digest of a presented token in `user_sessions`.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::UserId;
use crate::repository::StoreError;
use crate::StorefrontError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl From<AuthError> for StorefrontError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Sqlx(e) => StorefrontError::Storage(StoreError::Sqlx(e)),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The user a bearer token belongs to, or `None` for unknown or expired tokens.
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, AuthError>;
}

pub fn token_digest(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone)]
pub struct PgAuthenticator {
    pool: PgPool,
}

impl PgAuthenticator {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl Authenticator for PgAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<UserId>, AuthError> {
        let user: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM user_sessions WHERE token_hash = $1 AND expires_at > NOW()")
            .bind(token_digest(token))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user.map(UserId::new))
    }
}
