use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NewAuthLogEntry {
    pub user_id: Option<UserId>,
    pub action: AuthAction,
    pub ip: String,
    pub user_agent: Option<String>,
    pub success: bool,
    pub detail: Option<String>,
}

#[async_trait::async_trait]
pub trait AuthLogRepo: Send + Sync {
    /// Append-only. Entries are never mutated.
    async fn append(&self, entry: &NewAuthLogEntry) -> Result<(), AuthError>;

    /// Most recent first.
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<AuthLogEntry>, AuthError>;

    /// Administrative cleanup: drop entries older than `cutoff`.
    /// Returns the number deleted.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError>;
}
