use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::models::{RegistrationRow, RegistrationStatsRow, RegistrationStatus};

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO registrations (
  name,
  cpf,
  sex,
  congregation,
  phone,
  status,
  amount_cents,
  created_at
) VALUES (?, ?, ?, ?, ?, 'Pendente', ?, ?)
RETURNING id
"#;

// A payment id, once attached, is never replaced by a different one.
const SQL_ATTACH_PAYMENT: &str = r#"
UPDATE registrations
SET payment_id = ?1,
    qr_code = ?2,
    qr_code_base64 = ?3,
    payment_claim = NULL,
    payment_claimed_at = NULL
WHERE id = ?4
  AND (payment_id IS NULL OR payment_id = ?1)
"#;

// One PIX request in flight per registration; a claim older than ?3 is abandoned.
const SQL_CLAIM_PAYMENT: &str = r#"
UPDATE registrations
SET payment_claim = ?1,
    payment_claimed_at = ?2
WHERE id = ?4
  AND payment_id IS NULL
  AND status = 'Pendente'
  AND (payment_claim IS NULL OR payment_claimed_at < ?3)
"#;

const SQL_RELEASE_PAYMENT_CLAIM: &str = r#"
UPDATE registrations
SET payment_claim = NULL,
    payment_claimed_at = NULL
WHERE id = ?
  AND payment_claim = ?
"#;

// Pending -> Paid and same-status writes only; Paid never reverts here.
const SQL_UPDATE_STATUS: &str = r#"
UPDATE registrations
SET status = ?1
WHERE id = ?2
  AND (status = ?1 OR status = 'Pendente')
"#;

const SQL_UPDATE_REGISTRATION: &str = r#"
UPDATE registrations
SET name = ?,
    cpf = ?,
    sex = ?,
    congregation = ?,
    phone = ?,
    status = ?
WHERE id = ?
"#;

const SQL_SELECT_COLUMNS: &str = r#"
SELECT
  id,
  name,
  cpf,
  sex,
  congregation,
  phone,
  status,
  payment_id,
  qr_code,
  qr_code_base64,
  amount_cents,
  created_at
FROM registrations
"#;

const SQL_LIST_STATS: &str = r#"
SELECT status, sex
FROM registrations
"#;

pub struct NewRegistration<'a> {
    pub name: &'a str,
    pub cpf: &'a str,
    pub sex: &'a str,
    pub congregation: &'a str,
    pub phone: &'a str,
    pub amount_cents: i64,
    pub created_at: NaiveDateTime,
}

pub struct RegistrationEdit<'a> {
    pub name: &'a str,
    pub cpf: &'a str,
    pub sex: &'a str,
    pub congregation: &'a str,
    pub phone: &'a str,
    pub status: RegistrationStatus,
}

pub async fn insert_registration(pool: &SqlitePool, new: NewRegistration<'_>) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_INSERT_REGISTRATION)
        .bind(new.name)
        .bind(new.cpf)
        .bind(new.sex)
        .bind(new.congregation)
        .bind(new.phone)
        .bind(new.amount_cents)
        .bind(new.created_at)
        .fetch_one(pool)
        .await
}

pub async fn attach_payment(
    pool: &SqlitePool,
    id: i64,
    payment_id: &str,
    qr_code: &str,
    qr_code_base64: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_ATTACH_PAYMENT)
        .bind(payment_id)
        .bind(qr_code)
        .bind(qr_code_base64)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Marks `id` as having a PIX request in flight under `claim`.
/// Zero rows means a payment is attached, another request holds the claim,
/// the registration is already paid, or the id is unknown.
pub async fn claim_payment(
    pool: &SqlitePool,
    id: i64,
    claim: &str,
    claimed_at: i64,
    stale_before: i64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_CLAIM_PAYMENT)
        .bind(claim)
        .bind(claimed_at)
        .bind(stale_before)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn release_payment_claim(pool: &SqlitePool, id: i64, claim: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_RELEASE_PAYMENT_CLAIM)
        .bind(id)
        .bind(claim)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: RegistrationStatus,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_STATUS)
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn update_registration(
    pool: &SqlitePool,
    id: i64,
    edit: RegistrationEdit<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_REGISTRATION)
        .bind(edit.name)
        .bind(edit.cpf)
        .bind(edit.sex)
        .bind(edit.congregation)
        .bind(edit.phone)
        .bind(edit.status.as_str())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn get_registration(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<RegistrationRow>> {
    let sql = format!("{SQL_SELECT_COLUMNS} WHERE id = ? LIMIT 1");
    sqlx::query_as::<_, RegistrationRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first, optionally restricted to one status.
pub async fn list_registrations(
    pool: &SqlitePool,
    status: Option<RegistrationStatus>,
) -> sqlx::Result<Vec<RegistrationRow>> {
    match status {
        Some(status) => {
            let sql = format!("{SQL_SELECT_COLUMNS} WHERE status = ? ORDER BY id DESC");
            sqlx::query_as::<_, RegistrationRow>(&sql)
                .bind(status.as_str())
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!("{SQL_SELECT_COLUMNS} ORDER BY id DESC");
            sqlx::query_as::<_, RegistrationRow>(&sql)
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn list_stats(pool: &SqlitePool) -> sqlx::Result<Vec<RegistrationStatsRow>> {
    sqlx::query_as::<_, RegistrationStatsRow>(SQL_LIST_STATS)
        .fetch_all(pool)
        .await
}
