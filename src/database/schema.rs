use sqlx::SqlitePool;

const SQL_CREATE_REGISTRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS registrations (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL DEFAULT '',
  cpf TEXT NOT NULL DEFAULT '',
  sex TEXT NOT NULL DEFAULT '',
  congregation TEXT NOT NULL DEFAULT '',
  phone TEXT NOT NULL DEFAULT '',
  status TEXT NOT NULL DEFAULT 'Pendente',
  payment_id TEXT,
  qr_code TEXT,
  qr_code_base64 TEXT,
  payment_claim TEXT,
  payment_claimed_at INTEGER,
  amount_cents INTEGER NOT NULL,
  created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

const SQL_CREATE_REGISTRATIONS_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_registrations_status ON registrations (status)
"#;

const SQL_CREATE_GALLERY: &str = r#"
CREATE TABLE IF NOT EXISTS gallery (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  kind TEXT NOT NULL,
  url TEXT NOT NULL,
  title TEXT NOT NULL DEFAULT ''
)
"#;

const SQL_CREATE_ADMIN_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS admin_sessions (
  token TEXT PRIMARY KEY,
  expires_at INTEGER NOT NULL
)
"#;

/// Creates the tables when missing. Safe to run on every boot.
pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for sql in [
        SQL_CREATE_REGISTRATIONS,
        SQL_CREATE_REGISTRATIONS_STATUS_INDEX,
        SQL_CREATE_GALLERY,
        SQL_CREATE_ADMIN_SESSIONS,
    ] {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}
