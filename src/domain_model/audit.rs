use super::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fixed enumeration of auditable authentication events.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Register,
    Login,
    Logout,
    Verify,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::Register => "register",
            AuthAction::Login => "login",
            AuthAction::Logout => "logout",
            AuthAction::Verify => "verify",
        }
    }
}

impl std::str::FromStr for AuthAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "register" => Ok(AuthAction::Register),
            "login" => Ok(AuthAction::Login),
            "logout" => Ok(AuthAction::Logout),
            "verify" => Ok(AuthAction::Verify),
            other => Err(format!("unknown auth action: {other}")),
        }
    }
}

/// Append-only audit record. `user_id` is None when the event could not be
/// tied to an account (failed login against an unknown identifier).
#[derive(Debug, Clone, Serialize)]
pub struct AuthLogEntry {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub action: AuthAction,
    pub ip: String,
    pub user_agent: Option<String>,
    pub success: bool,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
