use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Money in integer cents (BRL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Amount(i64);

impl Amount {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    /// Decimal value in reais, as the gateway expects `transaction_amount`.
    pub fn as_reais(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}R$ {},{:02}", sign, abs / 100, abs % 100)
    }
}

/// Two price tiers split by a single cutoff instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    pub cutoff: DateTime<FixedOffset>,
    pub tier1: Amount,
    pub tier2: Amount,
}

impl PricingPolicy {
    /// Tier 1 up to and including the cutoff, tier 2 afterwards.
    pub fn current_price(&self, now: DateTime<Utc>) -> Amount {
        if now <= self.cutoff {
            self.tier1
        } else {
            self.tier2
        }
    }

    /// Cutoff formatted for the landing page ("20/01/2025 23:59").
    pub fn cutoff_label(&self) -> String {
        self.cutoff.format("%d/%m/%Y %H:%M").to_string()
    }
}
