//! Admin session: a signed cookie carrying `<issued unix secs>.<token>`, backed by a
//! row in `admin_sessions` so logout revokes it server-side.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, TimeZone, Utc};
use cookie::{time::Duration, Cookie, CookieJar, Key, SameSite};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::sessions_repo;

pub const SESSION_COOKIE: &str = "admin_session";
pub const SESSION_HOURS: i64 = 12;

/// Tolerated clock drift for tokens stamped slightly in the future.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Proof that the request carries a valid admin session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminSession {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(issued_at: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            issued_at,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + chrono::Duration::hours(SESSION_HOURS)
    }

    /// Age check only; revocation lives in the store.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let skew = chrono::Duration::seconds(MAX_CLOCK_SKEW_SECS);
        self.issued_at <= now + skew && now < self.expires_at()
    }

    fn cookie_value(&self) -> String {
        format!("{}.{}", self.issued_at.timestamp(), self.token)
    }

    fn parse(value: &str) -> Option<Self> {
        let (issued, token) = value.split_once('.')?;
        if token.is_empty() {
            return None;
        }
        let issued_at = Utc.timestamp_opt(issued.parse().ok()?, 0).single()?;
        Some(Self {
            token: token.to_string(),
            issued_at,
        })
    }
}

/// Stores a fresh session and drops the ones that already expired.
pub async fn start_session(pool: &SqlitePool, now: DateTime<Utc>) -> sqlx::Result<AdminSession> {
    sessions_repo::delete_expired_sessions(pool, now.timestamp()).await?;
    let admin = AdminSession::new(now);
    sessions_repo::insert_session(pool, &admin.token, admin.expires_at().timestamp()).await?;
    Ok(admin)
}

pub async fn end_session(pool: &SqlitePool, admin: &AdminSession) -> sqlx::Result<()> {
    sessions_repo::delete_session(pool, &admin.token).await?;
    Ok(())
}

pub async fn is_active(
    pool: &SqlitePool,
    admin: &AdminSession,
    now: DateTime<Utc>,
) -> sqlx::Result<bool> {
    sessions_repo::session_is_active(pool, &admin.token, now.timestamp()).await
}

/// Signed cookie marking the browser as logged in.
pub fn issue_session_cookie(key: &Key, admin: &AdminSession) -> Cookie<'static> {
    let mut jar = CookieJar::new();
    jar.signed_mut(key).add(
        Cookie::build((SESSION_COOKIE, admin.cookie_value()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::hours(SESSION_HOURS)),
    );
    jar.get(SESSION_COOKIE)
        .cloned()
        .unwrap_or_else(|| Cookie::new(SESSION_COOKIE, ""))
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

/// Verifies signature and age of the session cookie, if any. Does not consult the store.
pub fn read_admin_session(
    headers: &HeaderMap,
    key: &Key,
    now: DateTime<Utc>,
) -> Option<AdminSession> {
    let mut jar = CookieJar::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for cookie in Cookie::split_parse(raw).flatten() {
            jar.add_original(cookie.into_owned());
        }
    }

    let cookie = jar.signed(key).get(SESSION_COOKIE)?;
    AdminSession::parse(cookie.value()).filter(|admin| admin.is_fresh(now))
}
