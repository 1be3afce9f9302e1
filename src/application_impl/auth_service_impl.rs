use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    username: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

pub struct JwtHs256Codec {
    cfg: TokenConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: TokenConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    fn map_decode_err(e: &jsonwebtoken::errors::Error) -> AuthError {
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::TokenInvalid,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::TokenMalformed,
            _ => AuthError::TokenInvalid,
        }
    }

    fn claims_to_payload(claims: Claims) -> Result<TokenClaims, AuthError> {
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenMalformed)?;
        let issued_at =
            DateTime::<Utc>::from_timestamp(claims.iat, 0).ok_or(AuthError::TokenMalformed)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::TokenMalformed)?;
        Ok(TokenClaims {
            user_id,
            username: claims.username,
            issued_at,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue(
        &self,
        user_id: UserId,
        username: &str,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + self.cfg.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &v,
        )
        .map_err(|e| Self::map_decode_err(&e))?;
        Self::claims_to_payload(data.claims)
    }
}

/// HMAC-SHA256 hex digest of an issued token, stored in the advisory
/// session table instead of the token itself.
fn token_digest(key: &[u8], token: &str) -> Result<String, AuthError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
    mac.update(token.as_bytes());
    let out = mac.finalize().into_bytes();
    Ok(hex::encode(out))
}

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    session_repo: Arc<dyn SessionRepo>,
    auth_log_repo: Arc<dyn AuthLogRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    digest_key: Vec<u8>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        session_repo: Arc<dyn SessionRepo>,
        auth_log_repo: Arc<dyn AuthLogRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        digest_key: Vec<u8>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            auth_log_repo,
            credential_hasher,
            token_codec,
            digest_key,
        }
    }

    fn validate_register(request: &RegisterInput) -> Result<(), AuthError> {
        let username_ok = (MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&request.username.len())
            && request
                .username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !username_ok {
            return Err(AuthError::InvalidInput(format!(
                "username must be {MIN_USERNAME_LEN}-{MAX_USERNAME_LEN} alphanumeric characters"
            )));
        }
        let email = request.email.as_str();
        let email_ok = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !email_ok || email.len() > 255 {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        if request.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Audit writes never fail the primary request.
    async fn log_attempt(
        &self,
        user_id: Option<UserId>,
        action: AuthAction,
        meta: &ClientMeta,
        success: bool,
        detail: Option<&str>,
    ) {
        let entry = NewAuthLogEntry {
            user_id,
            action,
            ip: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            success,
            detail: detail.map(str::to_string),
        };
        if let Err(e) = self.auth_log_repo.append(&entry).await {
            warn!("audit log write failed: {}", e);
        }
    }

    /// Advisory session row; a write failure is logged and ignored.
    async fn record_session(&self, user_id: UserId, token: &AccessToken, expires_at: DateTime<Utc>) {
        let digest = match token_digest(&self.digest_key, &token.0) {
            Ok(d) => d,
            Err(e) => {
                warn!("session digest failed: {}", e);
                return;
            }
        };
        let session = NewSession {
            user_id,
            token_digest: digest,
            expires_at,
        };
        if let Err(e) = self.session_repo.insert(&session).await {
            warn!("session record write failed: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn register(
        &self,
        request: RegisterInput,
        meta: &ClientMeta,
    ) -> Result<AuthOutcome, AuthError> {
        Self::validate_register(&request)?;

        // Advisory only; the unique constraint at insert time is the authority.
        if self
            .user_repo
            .username_or_email_exists(&request.username, &request.email)
            .await?
        {
            self.log_attempt(
                None,
                AuthAction::Register,
                meta,
                false,
                Some("duplicate username or email"),
            )
            .await;
            return Err(AuthError::Conflict);
        }

        let password_hash = self
            .credential_hasher
            .hash_password(&request.password)
            .await?;
        let user_id = UserId::generate();
        let new_user = NewUser {
            user_id,
            username: request.username,
            email: request.email,
            password_hash,
            full_name: request.full_name,
            role: Role::User,
            is_verified: true,
        };

        if let Err(e) = self.user_repo.create(&new_user).await {
            if matches!(e, AuthError::Conflict) {
                self.log_attempt(
                    None,
                    AuthAction::Register,
                    meta,
                    false,
                    Some("duplicate username or email"),
                )
                .await;
            }
            return Err(e);
        }

        let record = self
            .user_repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::Store("created user row missing".to_string()))?;

        let (token, expires_at) = self.token_codec.issue(user_id, &record.username).await?;
        self.record_session(user_id, &token, expires_at).await;
        self.log_attempt(Some(user_id), AuthAction::Register, meta, true, None)
            .await;

        Ok(AuthOutcome {
            user: record.to_public(),
            token,
            expires_at,
        })
    }

    async fn login(
        &self,
        request: LoginInput,
        meta: &ClientMeta,
    ) -> Result<AuthOutcome, AuthError> {
        let Some(rec) = self.user_repo.get_by_identifier(&request.identifier).await? else {
            self.log_attempt(
                None,
                AuthAction::Login,
                meta,
                false,
                Some("unknown identifier"),
            )
            .await;
            // Same error as a wrong password; no account enumeration.
            return Err(AuthError::InvalidCredentials);
        };

        if !rec.is_verified {
            self.log_attempt(
                Some(rec.user_id),
                AuthAction::Login,
                meta,
                false,
                Some("account not verified"),
            )
            .await;
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&request.password, &rec.password_hash)
            .await?;
        if !ok {
            self.log_attempt(
                Some(rec.user_id),
                AuthAction::Login,
                meta,
                false,
                Some("password mismatch"),
            )
            .await;
            return Err(AuthError::InvalidCredentials);
        }

        self.user_repo.touch_last_login(rec.user_id).await?;

        let (token, expires_at) = self.token_codec.issue(rec.user_id, &rec.username).await?;
        self.record_session(rec.user_id, &token, expires_at).await;
        self.log_attempt(Some(rec.user_id), AuthAction::Login, meta, true, None)
            .await;

        Ok(AuthOutcome {
            user: rec.to_public(),
            token,
            expires_at,
        })
    }

    async fn logout(&self, user: &AuthedUser, meta: &ClientMeta) -> Result<(), AuthError> {
        // Stateless tokens stay valid until expiry; this is an audit event.
        self.log_attempt(Some(user.user_id), AuthAction::Logout, meta, true, None)
            .await;
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.token_codec.verify(token).await
    }
}
