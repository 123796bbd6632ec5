use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::RegistrationStatus;
use crate::services::payment_gateway::{value_to_id, PaymentGateway};
use crate::services::registration_service;

/// Body of a gateway notification: `{"action": "payment.updated", "data": {"id": "123"}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotification {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationData {
    #[serde(default)]
    pub id: Option<Value>,
}

impl PaymentNotification {
    /// Only payment create/update notifications trigger reconciliation.
    pub fn is_payment_change(&self) -> bool {
        let Some(action) = self.action.as_deref() else {
            return false;
        };
        let kind = action.strip_prefix("payment.").unwrap_or(action);
        matches!(kind, "created" | "updated")
    }

    pub fn payment_id(&self) -> Option<String> {
        self.data.as_ref()?.id.as_ref().and_then(value_to_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Not a payment change, no payment id, or no gateway to ask.
    Ignored,
    /// The gateway reported no usable external reference, or it matches no registration.
    UnknownReference,
    /// The registration now carries `status` (possibly unchanged).
    Applied {
        registration_id: i64,
        status: RegistrationStatus,
    },
    /// The registration is paid and the gateway no longer reports approval; kept as paid.
    Kept { registration_id: i64 },
}

/// Re-derives the payment state from the gateway and writes it to the store.
///
/// The notification body is only used to learn which payment to look up, so
/// repeated and out-of-order deliveries converge on the gateway's answer.
pub async fn reconcile(
    pool: &SqlitePool,
    gateway: Option<&dyn PaymentGateway>,
    notification: &PaymentNotification,
) -> Result<ReconcileOutcome, AppError> {
    if !notification.is_payment_change() {
        return Ok(ReconcileOutcome::Ignored);
    }
    let Some(payment_id) = notification.payment_id() else {
        warn!(action = ?notification.action, "payment notification without data.id");
        return Ok(ReconcileOutcome::Ignored);
    };
    let Some(gateway) = gateway else {
        warn!(payment_id = %payment_id, "payment notification received but gateway is not configured");
        return Ok(ReconcileOutcome::Ignored);
    };

    let payment = gateway.get_payment_status(&payment_id).await?;
    let status = if payment.approved {
        RegistrationStatus::Paid
    } else {
        RegistrationStatus::Pending
    };

    let Some(registration_id) = payment
        .external_reference
        .as_deref()
        .and_then(|r| r.trim().parse::<i64>().ok())
    else {
        info!(payment_id = %payment_id, reference = ?payment.external_reference, "payment has no usable external reference");
        return Ok(ReconcileOutcome::UnknownReference);
    };

    if registration_service::update_status(pool, registration_id, status).await? {
        info!(registration_id, payment_id = %payment_id, status = %status, "registration status reconciled");
        return Ok(ReconcileOutcome::Applied {
            registration_id,
            status,
        });
    }

    // No row matched: either the registration does not exist or it is already paid.
    match registration_service::get_registration(pool, registration_id).await {
        Ok(_) => {
            warn!(registration_id, payment_id = %payment_id, "gateway reports unpaid for a paid registration, keeping paid");
            Ok(ReconcileOutcome::Kept { registration_id })
        }
        Err(AppError::NotFound) => {
            info!(registration_id, payment_id = %payment_id, "payment references an unknown registration");
            Ok(ReconcileOutcome::UnknownReference)
        }
        Err(e) => Err(e),
    }
}
