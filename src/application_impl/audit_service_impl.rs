use crate::application_port::{AuditService, AuthError};
use crate::domain_model::AuthLogEntry;
use crate::domain_port::AuthLogRepo;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct RealAuditService {
    auth_log_repo: Arc<dyn AuthLogRepo>,
}

impl RealAuditService {
    pub fn new(auth_log_repo: Arc<dyn AuthLogRepo>) -> RealAuditService {
        RealAuditService { auth_log_repo }
    }
}

#[async_trait::async_trait]
impl AuditService for RealAuditService {
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<AuthLogEntry>, AuthError> {
        self.auth_log_repo.list(limit, offset).await
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        self.auth_log_repo.purge_before(cutoff).await
    }
}
