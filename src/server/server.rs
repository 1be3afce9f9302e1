use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use nanoid::nanoid;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub audit_service: Arc<dyn AuditService>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Pool<MySql>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let db = &settings.database;
        let dsn = format!(
            "mysql://{}:{}@{}:{}/{}",
            db.user, db.password, db.host, db.port, db.name
        );
        // Lazy: fake backends never touch the pool, and startup does not
        // depend on the database being reachable.
        let pool = MySqlPoolOptions::new()
            .max_connections(db.max_connections)
            .connect_lazy(&dsn)?;

        let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));
        let session_repo: Arc<dyn SessionRepo> = Arc::new(MySqlSessionRepo::new(pool.clone()));
        let auth_log_repo: Arc<dyn AuthLogRepo> = Arc::new(MySqlAuthLogRepo::new(pool.clone()));

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher {});
        let signing_key = settings.auth.signing_secret.clone().into_bytes();
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(TokenConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            ttl: Duration::from_secs(settings.auth.token_ttl_secs),
            signing_key: signing_key.clone(),
        }));

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => Arc::new(RealAuthService::new(
                user_repo.clone(),
                session_repo.clone(),
                auth_log_repo.clone(),
                credential_hasher,
                token_codec,
                signing_key,
            )),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        let user_service: Arc<dyn UserService> = match settings.user.backend.as_str() {
            "fake" => Arc::new(FakeUserService::new()),
            "real" => Arc::new(RealUserService::new(user_repo.clone())),
            other => return Err(anyhow::anyhow!("Unknown user backend: {}", other)),
        };

        let audit_service: Arc<dyn AuditService> = match settings.audit.backend.as_str() {
            "fake" => Arc::new(FakeAuditService::new()),
            "real" => Arc::new(RealAuditService::new(auth_log_repo.clone())),
            other => return Err(anyhow::anyhow!("Unknown audit backend: {}", other)),
        };

        let rate_limiter: Arc<dyn RateLimiter> =
            Arc::new(SlidingWindowRateLimiter::new(RateLimitConfig {
                window: Duration::from_secs(settings.rate_limit.window_secs),
                auth_max: settings.rate_limit.auth_max as usize,
                global_max: settings.rate_limit.global_max as usize,
            }));

        // region runtime infra
        let cancel = CancellationToken::new();

        // Periodic upkeep: prune idle rate-limit windows and, when a real
        // store is in play, drop expired advisory session rows.
        let sweep_sessions = settings.auth.backend == "real";
        let sweeper_handle = {
            let rate_limiter = rate_limiter.clone();
            let session_repo = session_repo.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
                    }
                    rate_limiter.prune();
                    if sweep_sessions {
                        match session_repo.delete_expired().await {
                            Ok(0) => {}
                            Ok(n) => debug!("swept {} expired sessions", n),
                            Err(e) => warn!("session sweep failed: {}", e),
                        }
                    }
                }
            })
        };
        // endregion

        info!(%run_id, "server started");

        Ok(Self {
            auth_service,
            user_service,
            audit_service,
            rate_limiter,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Ok(mut lock) = self.sweeper_handle.lock() {
            if let Some(handle) = lock.take() {
                let r = handle.await;
                info!("sweeper handle dropped: {:?}", r);
            }
        }

        self.pool.close().await;
    }
}
