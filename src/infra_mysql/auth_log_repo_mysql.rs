use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlAuthLogRepo {
    pool: MySqlPool,
}

impl MySqlAuthLogRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAuthLogRepo { pool }
    }

    fn row_to_entry(row: MySqlRow) -> Result<AuthLogEntry, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id: Option<UserId> = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let action: String = row
            .try_get("action")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let action = action.parse::<AuthAction>().map_err(AuthError::Store)?;
        let ip: String = row
            .try_get("ip")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_agent: Option<String> = row
            .try_get("user_agent")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let success: bool = row
            .try_get("success")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let detail: Option<String> = row
            .try_get("detail")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(AuthLogEntry {
            id,
            user_id,
            action,
            ip,
            user_agent,
            success,
            detail,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl AuthLogRepo for MySqlAuthLogRepo {
    async fn append(&self, entry: &NewAuthLogEntry) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO auth_log (user_id, action, ip, user_agent, success, detail)
VALUES (?, ?, ?, ?, ?, ?)
"#,
        )
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(entry.success)
        .bind(&entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<AuthLogEntry>, AuthError> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
SELECT id, user_id, action, ip, user_agent, success, detail, created_at
FROM auth_log
ORDER BY id DESC
LIMIT ? OFFSET ?
"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM auth_log WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
