use crate::domain_model::{Role, User, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("username or email already taken")]
    Conflict,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token malformed")]
    TokenMalformed,
    #[error("token signature invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("user not found")]
    UserNotFound,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub identifier: String,
    pub password: String,
}

/// Request-scoped client facts carried into the audit log.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: Option<String>,
}

/// Identity attached to a request once the auth gate accepts it.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

/// Decoded token payload. The user freshness check belongs to the auth
/// gate, not the verifier.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    pub token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue(
        &self,
        user_id: UserId,
        username: &str,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;

    async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(
        &self,
        request: RegisterInput,
        meta: &ClientMeta,
    ) -> Result<AuthOutcome, AuthError>;

    async fn login(&self, request: LoginInput, meta: &ClientMeta)
    -> Result<AuthOutcome, AuthError>;

    /// Advisory: records the event, does not invalidate the token.
    async fn logout(&self, user: &AuthedUser, meta: &ClientMeta) -> Result<(), AuthError>;

    async fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}
