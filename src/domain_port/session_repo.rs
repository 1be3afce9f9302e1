use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SessionRepo: Send + Sync {
    /// Record an issued token. `expires_at` must be in the future.
    async fn insert(&self, session: &NewSession) -> Result<(), AuthError>;

    /// Remove rows past their expiry. Returns the number deleted.
    async fn delete_expired(&self) -> Result<u64, AuthError>;
}
