use super::error::*;
use super::handler;
use super::handler::{AuthLogPurgeQuery, AuthLogQuery};
use crate::application_port::{
    AuthService, AuthedUser, ClientMeta, RateLimiter, RateScope, UserService,
};
use crate::domain_model::Role;
use crate::server::Server;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::get()
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Global))
        .and_then(handler::health);

    let register = warp::post()
        .and(warp::path("register"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Auth))
        .and(warp::body::json())
        .and(client_meta())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Auth))
        .and(warp::body::json())
        .and(client_meta())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let profile = warp::get()
        .and(warp::path("profile"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Global))
        .and(with_verification(
            server.auth_service.clone(),
            server.user_service.clone(),
        ))
        .and(with(server.user_service.clone()))
        .and_then(handler::profile);

    let verify = warp::get()
        .and(warp::path("verify"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Global))
        .and(with_verification(
            server.auth_service.clone(),
            server.user_service.clone(),
        ))
        .and(with(server.user_service.clone()))
        .and_then(handler::verify);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Global))
        .and(with_verification(
            server.auth_service.clone(),
            server.user_service.clone(),
        ))
        .and(client_meta())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let list_auth_logs = warp::get()
        .and(warp::path("admin"))
        .and(warp::path("auth-logs"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Global))
        .and(warp::query::<AuthLogQuery>())
        .and(with_admin(
            server.auth_service.clone(),
            server.user_service.clone(),
        ))
        .and(with(server.audit_service.clone()))
        .and_then(handler::list_auth_logs);

    let purge_auth_logs = warp::delete()
        .and(warp::path("admin"))
        .and(warp::path("auth-logs"))
        .and(warp::path::end())
        .and(with_rate_limit(server.rate_limiter.clone(), RateScope::Global))
        .and(warp::query::<AuthLogPurgeQuery>())
        .and(with_admin(
            server.auth_service.clone(),
            server.user_service.clone(),
        ))
        .and(with(server.audit_service.clone()))
        .and_then(handler::purge_auth_logs);

    health
        .or(register)
        .or(login)
        .or(profile)
        .or(verify)
        .or(logout)
        .or(list_auth_logs)
        .or(purge_auth_logs)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn client_ip(addr: Option<SocketAddr>) -> String {
    addr.map_or_else(|| "unknown".to_string(), |a| a.ip().to_string())
}

fn client_meta() -> impl Filter<Extract = (ClientMeta,), Error = warp::Rejection> + Clone {
    warp::addr::remote()
        .and(warp::header::optional::<String>("user-agent"))
        .map(|addr: Option<SocketAddr>, user_agent: Option<String>| ClientMeta {
            ip: client_ip(addr),
            user_agent,
        })
}

/// Every request burns the global window; auth endpoints burn the tight
/// window on top.
fn with_rate_limit(
    limiter: Arc<dyn RateLimiter>,
    scope: RateScope,
) -> impl Filter<Extract = (), Error = warp::Rejection> + Clone {
    warp::addr::remote()
        .and_then(move |addr: Option<SocketAddr>| {
            let limiter = limiter.clone();
            async move {
                let client = client_ip(addr);
                limiter
                    .check(RateScope::Global, &client)
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)?;
                if scope == RateScope::Auth {
                    limiter
                        .check(RateScope::Auth, &client)
                        .map_err(ApiErrorCode::from)
                        .map_err(reject::custom)?;
                }
                Ok::<(), warp::Rejection>(())
            }
        })
        .untuple_one()
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
) -> impl Filter<Extract = (AuthedUser,), Error = warp::Rejection> + Clone {
    warp::header::<String>("authorization").and_then(move |header: String| {
        let auth_service = auth_service.clone();
        let user_service = user_service.clone();
        async move {
            let Some(token) = header.strip_prefix("Bearer ") else {
                return Err(reject::custom(ApiErrorCode::InvalidToken));
            };
            let claims = auth_service
                .verify_token(token)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)?;

            // The payload is only trusted as far as the account still
            // exists and is verified.
            let user = user_service
                .get_profile(claims.user_id)
                .await
                .map_err(|e| match e {
                    crate::application_port::AuthError::UserNotFound => ApiErrorCode::InvalidToken,
                    other => ApiErrorCode::from(other),
                })
                .map_err(reject::custom)?;
            if !user.is_verified {
                return Err(reject::custom(ApiErrorCode::InvalidToken));
            }

            Ok(AuthedUser {
                user_id: user.id,
                username: user.username,
                email: user.email,
                role: user.role,
            })
        }
    })
}

fn with_admin(
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
) -> impl Filter<Extract = (AuthedUser,), Error = warp::Rejection> + Clone {
    with_verification(auth_service, user_service).and_then(|user: AuthedUser| async move {
        if user.role == Role::Admin {
            Ok(user)
        } else {
            Err(reject::custom(ApiErrorCode::Forbidden))
        }
    })
}
