use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Full account row, password hash included. Stays behind the repo seam;
/// handlers only ever see [`User`].
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn to_public(&self) -> User {
        User {
            id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub is_verified: bool,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a row. A duplicate username or email must surface as
    /// `AuthError::Conflict`; the unique constraints are the authority.
    async fn create(&self, user: &NewUser) -> Result<(), AuthError>;

    /// Fetch by username OR email (login accepts either).
    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError>;

    /// Advisory pre-check only; racy under concurrent registration.
    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AuthError>;

    async fn touch_last_login(&self, user_id: UserId) -> Result<(), AuthError>;
}
