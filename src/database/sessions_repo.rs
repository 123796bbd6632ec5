use sqlx::SqlitePool;

const SQL_INSERT_SESSION: &str = r#"
INSERT INTO admin_sessions (token, expires_at)
VALUES (?, ?)
"#;

const SQL_SESSION_IS_ACTIVE: &str = r#"
SELECT EXISTS (
  SELECT 1
  FROM admin_sessions
  WHERE token = ?
    AND expires_at > ?
)
"#;

const SQL_DELETE_SESSION: &str = r#"
DELETE FROM admin_sessions
WHERE token = ?
"#;

const SQL_DELETE_EXPIRED_SESSIONS: &str = r#"
DELETE FROM admin_sessions
WHERE expires_at <= ?
"#;

/// Timestamps are unix seconds.
pub async fn insert_session(pool: &SqlitePool, token: &str, expires_at: i64) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_SESSION)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn session_is_active(pool: &SqlitePool, token: &str, now: i64) -> sqlx::Result<bool> {
    let found = sqlx::query_scalar::<_, i64>(SQL_SESSION_IS_ACTIVE)
        .bind(token)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(found > 0)
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SESSION)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_expired_sessions(pool: &SqlitePool, now: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_EXPIRED_SESSIONS)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
