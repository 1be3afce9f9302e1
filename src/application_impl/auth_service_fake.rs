use crate::application_port::*;
use crate::domain_model::*;
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeAuthService {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal fake implementation for basic use only.
// Extend to simulate more error cases and configurable responses when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn register(
        &self,
        request: RegisterInput,
        _meta: &ClientMeta,
    ) -> Result<AuthOutcome, AuthError> {
        Ok(fake_outcome(&request.username))
    }

    async fn login(
        &self,
        request: LoginInput,
        _meta: &ClientMeta,
    ) -> Result<AuthOutcome, AuthError> {
        Ok(fake_outcome(&request.identifier))
    }

    async fn logout(&self, _user: &AuthedUser, _meta: &ClientMeta) -> Result<(), AuthError> {
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        if let Some(username) = token.strip_prefix("fake-token:") {
            let now = Utc::now();
            Ok(TokenClaims {
                user_id: fake_id(username),
                username: username.to_string(),
                issued_at: now,
                expires_at: now + Duration::days(1),
            })
        } else {
            Err(AuthError::TokenInvalid)
        }
    }
}

pub(crate) fn fake_id(username: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        username.as_bytes(),
    ))
}

pub(crate) fn fake_profile(username: &str) -> User {
    let now = Utc::now();
    let role = if username == "admin" {
        Role::Admin
    } else {
        Role::User
    };
    User {
        id: fake_id(username),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: None,
        role,
        is_verified: true,
        created_at: now,
        updated_at: now,
    }
}

fn fake_outcome(username: &str) -> AuthOutcome {
    AuthOutcome {
        user: fake_profile(username),
        token: AccessToken(format!("fake-token:{username}")),
        expires_at: Utc::now() + Duration::days(1),
    }
}
