use chrono::NaiveDateTime;

use super::RegistrationStatus;
use crate::services::pricing::Amount;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub sex: String,
    pub congregation: String,
    pub phone: String,
    pub status: String,
    pub payment_id: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub amount_cents: i64,
    pub created_at: NaiveDateTime,
}

impl RegistrationRow {
    /// Unrecognised stored values read as pending.
    pub fn status(&self) -> RegistrationStatus {
        self.status.parse().unwrap_or(RegistrationStatus::Pending)
    }

    pub fn amount(&self) -> Amount {
        Amount::from_cents(self.amount_cents)
    }

    pub fn has_payment(&self) -> bool {
        self.payment_id.is_some()
    }
}

/// Projection used for the dashboard counters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationStatsRow {
    pub status: String,
    pub sex: String,
}
