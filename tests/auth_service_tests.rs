use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tradepost::application_impl::{Argon2PasswordHasher, JwtHs256Codec, RealAuthService, TokenConfig};
use tradepost::application_port::*;
use tradepost::domain_model::*;
use tradepost::domain_port::*;

/// In-memory repo doubles standing in for MySQL. `create` enforces the
/// uniqueness the database constraint would, so the conflict path behaves
/// like ER_DUP_ENTRY.
#[derive(Default)]
struct MemoryUserRepo {
    rows: Mutex<Vec<UserRecord>>,
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: &NewUser) -> Result<(), AuthError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.username == user.username || r.email == user.email)
        {
            return Err(AuthError::Conflict);
        }
        let now = Utc::now();
        rows.push(UserRecord {
            user_id: user.user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            is_verified: user.is_verified,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        });
        Ok(())
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, AuthError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.username == identifier || r.email == identifier)
            .cloned())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.user_id == user_id).cloned())
    }

    async fn username_or_email_exists(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AuthError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .any(|r| r.username == username || r.email == email))
    }

    async fn touch_last_login(&self, user_id: UserId) -> Result<(), AuthError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.user_id == user_id) {
            row.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
struct MemorySessionRepo {
    rows: Mutex<Vec<NewSession>>,
}

#[async_trait::async_trait]
impl SessionRepo for MemorySessionRepo {
    async fn insert(&self, session: &NewSession) -> Result<(), AuthError> {
        self.rows.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, AuthError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        let now = Utc::now();
        rows.retain(|s| s.expires_at > now);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
struct MemoryAuthLogRepo {
    rows: Mutex<Vec<(NewAuthLogEntry, DateTime<Utc>)>>,
}

impl MemoryAuthLogRepo {
    fn snapshot(&self) -> Vec<NewAuthLogEntry> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl AuthLogRepo for MemoryAuthLogRepo {
    async fn append(&self, entry: &NewAuthLogEntry) -> Result<(), AuthError> {
        self.rows
            .lock()
            .unwrap()
            .push((entry.clone(), Utc::now()));
        Ok(())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<AuthLogEntry>, AuthError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .enumerate()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(i, (e, at))| AuthLogEntry {
                id: i as i64 + 1,
                user_id: e.user_id,
                action: e.action,
                ip: e.ip.clone(),
                user_agent: e.user_agent.clone(),
                success: e.success,
                detail: e.detail.clone(),
                created_at: *at,
            })
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(_, at)| *at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

struct Harness {
    service: RealAuthService,
    users: Arc<MemoryUserRepo>,
    sessions: Arc<MemorySessionRepo>,
    logs: Arc<MemoryAuthLogRepo>,
}

fn harness() -> Harness {
    let users = Arc::new(MemoryUserRepo::default());
    let sessions = Arc::new(MemorySessionRepo::default());
    let logs = Arc::new(MemoryAuthLogRepo::default());
    let codec = JwtHs256Codec::new(TokenConfig {
        issuer: "tradepost.test".to_string(),
        audience: "tradepost-tests".to_string(),
        ttl: Duration::from_secs(3600),
        signing_key: b"test-signing-key".to_vec(),
    });
    let service = RealAuthService::new(
        users.clone(),
        sessions.clone(),
        logs.clone(),
        Arc::new(Argon2PasswordHasher),
        Arc::new(codec),
        b"test-signing-key".to_vec(),
    );
    Harness {
        service,
        users,
        sessions,
        logs,
    }
}

fn meta() -> ClientMeta {
    ClientMeta {
        ip: "127.0.0.1".to_string(),
        user_agent: Some("tests".to_string()),
    }
}

fn alice() -> RegisterInput {
    RegisterInput {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "Str0ng!Pass".to_string(),
        full_name: None,
    }
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let h = harness();

    let registered = h.service.register(alice(), &meta()).await.unwrap();
    assert_eq!(registered.user.username, "alice");
    assert!(registered.user.is_verified);
    assert_eq!(registered.user.role, Role::User);

    // The token returned by register verifies to the registered user.
    let claims = h.service.verify_token(&registered.token.0).await.unwrap();
    assert_eq!(claims.user_id, registered.user.id);

    // Login works by username and by email.
    for identifier in ["alice", "alice@example.com"] {
        let login = h
            .service
            .login(
                LoginInput {
                    identifier: identifier.to_string(),
                    password: "Str0ng!Pass".to_string(),
                },
                &meta(),
            )
            .await
            .unwrap();
        assert_eq!(login.user.id, registered.user.id);

        let claims = h.service.verify_token(&login.token.0).await.unwrap();
        assert_eq!(claims.user_id, registered.user.id);
        assert_eq!(claims.username, "alice");
    }
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let h = harness();
    h.service.register(alice(), &meta()).await.unwrap();

    let err = h.service.register(alice(), &meta()).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict));

    // Same email under a different username is still a conflict.
    let mut input = alice();
    input.username = "alice_two".to_string();
    let err = h.service.register(input, &meta()).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict));
}

/// Delegates to [`MemoryUserRepo`] but reports nothing from the advisory
/// existence pre-check, the window a concurrent registration slips through.
struct RacyUserRepo(Arc<MemoryUserRepo>);

#[async_trait::async_trait]
impl UserRepo for RacyUserRepo {
    async fn create(&self, user: &NewUser) -> Result<(), AuthError> {
        self.0.create(user).await
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, AuthError> {
        self.0.get_by_identifier(identifier).await
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        self.0.get_by_id(user_id).await
    }

    async fn username_or_email_exists(&self, _: &str, _: &str) -> Result<bool, AuthError> {
        Ok(false)
    }

    async fn touch_last_login(&self, user_id: UserId) -> Result<(), AuthError> {
        self.0.touch_last_login(user_id).await
    }
}

#[tokio::test]
async fn insert_time_conflict_is_authoritative() {
    let users = Arc::new(MemoryUserRepo::default());
    let codec = JwtHs256Codec::new(TokenConfig {
        issuer: "tradepost.test".to_string(),
        audience: "tradepost-tests".to_string(),
        ttl: Duration::from_secs(3600),
        signing_key: b"test-signing-key".to_vec(),
    });
    let service = RealAuthService::new(
        Arc::new(RacyUserRepo(users.clone())),
        Arc::new(MemorySessionRepo::default()),
        Arc::new(MemoryAuthLogRepo::default()),
        Arc::new(Argon2PasswordHasher),
        Arc::new(codec),
        b"test-signing-key".to_vec(),
    );

    service.register(alice(), &meta()).await.unwrap();

    // The pre-check is blind; the duplicate insert still must conflict.
    let err = service.register(alice(), &meta()).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let h = harness();
    h.service.register(alice(), &meta()).await.unwrap();

    let wrong_password = h
        .service
        .login(
            LoginInput {
                identifier: "alice".to_string(),
                password: "WrongPass!1".to_string(),
            },
            &meta(),
        )
        .await
        .unwrap_err();
    let unknown_user = h
        .service
        .login(
            LoginInput {
                identifier: "mallory".to_string(),
                password: "WrongPass!1".to_string(),
            },
            &meta(),
        )
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_user, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn unverified_account_cannot_login() {
    let h = harness();
    let hasher = Argon2PasswordHasher;
    h.users
        .create(&NewUser {
            user_id: UserId::generate(),
            username: "pending".to_string(),
            email: "pending@example.com".to_string(),
            password_hash: hasher.hash_password("Str0ng!Pass").await.unwrap(),
            full_name: None,
            role: Role::User,
            is_verified: false,
        })
        .await
        .unwrap();

    let err = h
        .service
        .login(
            LoginInput {
                identifier: "pending".to_string(),
                password: "Str0ng!Pass".to_string(),
            },
            &meta(),
        )
        .await
        .unwrap_err();

    // Same generic error as bad credentials.
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn logout_does_not_revoke() {
    let h = harness();
    let registered = h.service.register(alice(), &meta()).await.unwrap();

    let authed = AuthedUser {
        user_id: registered.user.id,
        username: registered.user.username.clone(),
        email: registered.user.email.clone(),
        role: registered.user.role,
    };
    h.service.logout(&authed, &meta()).await.unwrap();

    // Still valid until natural expiry.
    let claims = h.service.verify_token(&registered.token.0).await.unwrap();
    assert_eq!(claims.user_id, registered.user.id);
}

#[tokio::test]
async fn audit_trail_records_attempts() {
    let h = harness();
    let registered = h.service.register(alice(), &meta()).await.unwrap();

    let _ = h
        .service
        .login(
            LoginInput {
                identifier: "mallory".to_string(),
                password: "x".repeat(8),
            },
            &meta(),
        )
        .await;
    h.service
        .login(
            LoginInput {
                identifier: "alice".to_string(),
                password: "Str0ng!Pass".to_string(),
            },
            &meta(),
        )
        .await
        .unwrap();

    let entries = h.logs.snapshot();
    assert_eq!(entries.len(), 3);

    assert_eq!(entries[0].action, AuthAction::Register);
    assert!(entries[0].success);
    assert_eq!(entries[0].user_id, Some(registered.user.id));

    // Failed login against an unknown identifier has no user reference.
    assert_eq!(entries[1].action, AuthAction::Login);
    assert!(!entries[1].success);
    assert_eq!(entries[1].user_id, None);

    assert_eq!(entries[2].action, AuthAction::Login);
    assert!(entries[2].success);
    assert_eq!(entries[2].user_id, Some(registered.user.id));

    assert!(entries.iter().all(|e| e.ip == "127.0.0.1"));
}

#[tokio::test]
async fn sessions_record_issuance() {
    let h = harness();
    let registered = h.service.register(alice(), &meta()).await.unwrap();

    let sessions = h.sessions.rows.lock().unwrap().clone();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].user_id, registered.user.id);
    assert!(sessions[0].expires_at > Utc::now());
    // Digest, not the token itself.
    assert_ne!(sessions[0].token_digest, registered.token.0);
    assert_eq!(sessions[0].token_digest.len(), 64);

    assert_eq!(h.sessions.delete_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn login_touches_last_login() {
    let h = harness();
    let registered = h.service.register(alice(), &meta()).await.unwrap();
    assert!(
        h.users
            .get_by_id(registered.user.id)
            .await
            .unwrap()
            .unwrap()
            .last_login_at
            .is_none()
    );

    h.service
        .login(
            LoginInput {
                identifier: "alice".to_string(),
                password: "Str0ng!Pass".to_string(),
            },
            &meta(),
        )
        .await
        .unwrap();

    assert!(
        h.users
            .get_by_id(registered.user.id)
            .await
            .unwrap()
            .unwrap()
            .last_login_at
            .is_some()
    );
}
