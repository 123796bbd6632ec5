use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::DateTime;
use thiserror::Error;
use tracing::info;

use crate::services::pricing::{Amount, PricingPolicy};

const DEFAULT_MP_API_URL: &str = "https://api.mercadopago.com";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_PRICE_CUTOFF: &str = "2025-01-20T23:59:59-03:00";
const DEFAULT_PAYER_EMAIL: &str = "participante@retiro.com";
const PLACEHOLDER_TOKEN_MARKER: &str = "SEU-TOKEN";
const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub access_token: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub admin_password: String,
    pub session_secret: String,
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub payer_email: String,
    /// `None` when no usable access token is configured; registrations then skip payment.
    pub gateway: Option<GatewayConfig>,
    pub pricing: PricingPolicy,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = required(&lookup, "SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
            });
        }

        let gateway = lookup("MP_ACCESS_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && !t.contains(PLACEHOLDER_TOKEN_MARKER))
            .map(|access_token| GatewayConfig {
                access_token,
                api_url: with_default(&lookup, "MP_API_URL", DEFAULT_MP_API_URL),
            });
        if gateway.is_none() {
            info!("MP_ACCESS_TOKEN not set, registrations will not request PIX payments");
        }

        let cutoff_raw = with_default(&lookup, "PRICE_CUTOFF", DEFAULT_PRICE_CUTOFF);
        let cutoff = DateTime::parse_from_rfc3339(&cutoff_raw).map_err(|e| ConfigError::Invalid {
            key: "PRICE_CUTOFF",
            reason: e.to_string(),
        })?;

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            host: with_default(&lookup, "HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 3000)?,
            admin_password: required(&lookup, "ADMIN_PASSWORD")?,
            session_secret,
            base_url: with_default(&lookup, "BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            upload_dir: PathBuf::from(with_default(&lookup, "UPLOAD_DIR", "public/uploads")),
            upload_max_bytes: parsed(&lookup, "UPLOAD_MAX_BYTES", 50 * 1024 * 1024)?,
            payer_email: with_default(&lookup, "PAYER_EMAIL", DEFAULT_PAYER_EMAIL),
            gateway,
            pricing: PricingPolicy {
                cutoff,
                tier1: Amount::from_cents(parsed(&lookup, "PRICE_TIER1_CENTS", 10_000)?),
                tier2: Amount::from_cents(parsed(&lookup, "PRICE_TIER2_CENTS", 15_000)?),
            },
        })
    }

    pub fn notification_url(&self) -> String {
        format!("{}/webhook/pagamento", self.base_url)
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn with_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
