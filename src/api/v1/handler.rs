use super::error::*;
use crate::application_port::{
    AuditService, AuthOutcome, AuthService, AuthedUser, ClientMeta, LoginInput, RegisterInput,
    UserService,
};
use crate::domain_model::{AuthLogEntry, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    let response = HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    };
    Ok(warp::reply::json(&response))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Shared shape of register and login success bodies.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        AuthResponse {
            token: outcome.token.0,
            expires_at: outcome.expires_at,
            user: outcome.user,
        }
    }
}

pub async fn register(
    body: RegisterRequest,
    meta: ClientMeta,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let register_input = RegisterInput {
        username: body.username,
        email: body.email,
        password: body.password,
        full_name: body.full_name,
    };
    let outcome = auth_service
        .register(register_input, &meta)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(AuthResponse::from(outcome));
    Ok(warp::reply::with_status(
        warp::reply::json(&api_response),
        StatusCode::CREATED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    meta: ClientMeta,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        identifier: body.identifier,
        password: body.password,
    };
    let outcome = auth_service
        .login(login_input, &meta)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let api_response = ApiResponse::ok(AuthResponse::from(outcome));
    Ok(warp::reply::json(&api_response))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

pub async fn profile(
    authed: AuthedUser,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_profile(authed.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ProfileResponse { user })))
}

/// Same body as `/profile`; exists so a client can cheaply test a stored
/// token.
pub async fn verify(
    authed: AuthedUser,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .get_profile(authed.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ProfileResponse { user })))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

pub async fn logout(
    authed: AuthedUser,
    meta: ClientMeta,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .logout(&authed, &meta)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = LogoutResponse {
        message: "Logged out; the token stays valid until it expires".to_string(),
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

const DEFAULT_LOG_PAGE: u32 = 50;
const MAX_LOG_PAGE: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct AuthLogQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AuthLogListResponse {
    pub entries: Vec<AuthLogEntry>,
}

pub async fn list_auth_logs(
    query: AuthLogQuery,
    _admin: AuthedUser,
    audit_service: Arc<dyn AuditService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_PAGE).min(MAX_LOG_PAGE);
    let offset = query.offset.unwrap_or(0);

    let entries = audit_service
        .list(limit, offset)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(AuthLogListResponse {
        entries,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AuthLogPurgeQuery {
    /// RFC 3339 cutoff; entries strictly older are removed.
    pub before: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AuthLogPurgeResponse {
    pub deleted: u64,
}

pub async fn purge_auth_logs(
    query: AuthLogPurgeQuery,
    _admin: AuthedUser,
    audit_service: Arc<dyn AuditService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let deleted = audit_service
        .purge_before(query.before)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(AuthLogPurgeResponse {
        deleted,
    })))
}
