use crate::application_port::AuthError;
use crate::domain_model::AuthLogEntry;
use chrono::{DateTime, Utc};

/// Administrative surface over the append-only auth log.
#[async_trait::async_trait]
pub trait AuditService: Send + Sync {
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<AuthLogEntry>, AuthError>;

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError>;
}
