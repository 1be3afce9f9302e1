use crate::application_port::{AuditService, AuthError};
use crate::domain_model::AuthLogEntry;
use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct FakeAuditService;

impl FakeAuditService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeAuditService {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal fake implementation for basic use only.
#[async_trait::async_trait]
impl AuditService for FakeAuditService {
    async fn list(&self, _limit: u32, _offset: u32) -> Result<Vec<AuthLogEntry>, AuthError> {
        Ok(Vec::new())
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        Ok(0)
    }
}
