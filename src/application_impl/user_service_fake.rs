use super::auth_service_fake::{fake_id, fake_profile};
use crate::application_port::{AuthError, UserService};
use crate::domain_model::{User, UserId};

#[derive(Debug)]
pub struct FakeUserService;

impl FakeUserService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FakeUserService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserService for FakeUserService {
    async fn get_profile(&self, user_id: UserId) -> Result<User, AuthError> {
        let username = if user_id == fake_id("admin") {
            "admin"
        } else {
            "fakeuser"
        };
        Ok(fake_profile(username))
    }
}
