use crate::application_port::*;
use crate::domain_port::*;
use sqlx::MySqlPool;

pub struct MySqlSessionRepo {
    pool: MySqlPool,
}

impl MySqlSessionRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionRepo { pool }
    }
}

#[async_trait::async_trait]
impl SessionRepo for MySqlSessionRepo {
    async fn insert(&self, session: &NewSession) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO session (user_id, token_digest, expires_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(session.user_id)
        .bind(&session.token_digest)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
