//! Registration workflow: persist the sign-up, ask the gateway for a PIX
//! payment, attach the payment references.
//!
//! A registration goes `Created -> PaymentRequested -> AwaitingConfirmation`;
//! the final `Confirmed` step belongs to the webhook reconciler.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::registrations_repo::{self, NewRegistration};
use crate::error::AppError;
use crate::models::{RegistrationRow, RegistrationStatus};
use crate::services::payment_gateway::{PayerIdentity, PaymentGateway, PixIntent, PixRequest};
use crate::services::pricing::PricingPolicy;

/// A PIX request claim older than this is treated as abandoned.
const PAYMENT_CLAIM_TTL_SECS: i64 = 300;

/// Fields of the public sign-up form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default, rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default, rename = "sexo")]
    pub sex: String,
    #[serde(default, rename = "congregacao")]
    pub congregation: String,
    #[serde(default, rename = "telefone")]
    pub phone: String,
}

/// How far the workflow got for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Gateway not configured; the registration stays without payment data.
    Created,
    /// Payment intent created and attached.
    AwaitingConfirmation(PixIntent),
    /// Gateway call failed; the registration stays pending without payment data.
    PaymentUnavailable,
}

pub struct Registered {
    pub id: i64,
    pub outcome: WorkflowOutcome,
}

/// Payer context that does not come from the form.
pub struct PaymentContext<'a> {
    pub gateway: Option<&'a dyn PaymentGateway>,
    pub payer_email: &'a str,
}

/// Inserts a pending registration priced at `now`. The amount never changes afterwards.
pub async fn create_registration(
    pool: &SqlitePool,
    pricing: &PricingPolicy,
    form: &RegistrationForm,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let amount = pricing.current_price(now);
    let id = registrations_repo::insert_registration(
        pool,
        NewRegistration {
            name: form.name.trim(),
            cpf: form.cpf.trim(),
            sex: form.sex.trim(),
            congregation: form.congregation.trim(),
            phone: form.phone.trim(),
            amount_cents: amount.cents(),
            created_at: now.naive_utc(),
        },
    )
    .await?;

    info!(registration_id = id, amount = %amount, "registration created");
    Ok(id)
}

pub async fn attach_payment(
    pool: &SqlitePool,
    id: i64,
    intent: &PixIntent,
) -> Result<(), AppError> {
    let updated = registrations_repo::attach_payment(
        pool,
        id,
        &intent.gateway_id,
        &intent.qr_payload,
        &intent.qr_image,
    )
    .await?;
    if updated > 0 {
        return Ok(());
    }

    match registrations_repo::get_registration(pool, id).await? {
        None => Err(AppError::NotFound),
        Some(_) => Err(AppError::PaymentConflict { registration_id: id }),
    }
}

/// Idempotent; a paid registration is never moved back to pending.
/// Returns whether a row matched.
pub async fn update_status(
    pool: &SqlitePool,
    id: i64,
    status: RegistrationStatus,
) -> Result<bool, AppError> {
    let updated = registrations_repo::update_status(pool, id, status).await?;
    Ok(updated > 0)
}

pub async fn get_registration(pool: &SqlitePool, id: i64) -> Result<RegistrationRow, AppError> {
    registrations_repo::get_registration(pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Full sign-up: a store failure aborts the request, a gateway failure does not.
pub async fn register(
    pool: &SqlitePool,
    pricing: &PricingPolicy,
    payment: &PaymentContext<'_>,
    form: &RegistrationForm,
    now: DateTime<Utc>,
) -> Result<Registered, AppError> {
    let id = create_registration(pool, pricing, form, now).await?;

    let Some(gateway) = payment.gateway else {
        return Ok(Registered {
            id,
            outcome: WorkflowOutcome::Created,
        });
    };

    let registration = get_registration(pool, id).await?;
    let outcome = request_payment(pool, gateway, payment.payer_email, &registration).await?;
    Ok(Registered { id, outcome })
}

/// Re-runs the payment step for a registration that has no payment attached yet.
/// Concurrent retries race for the same claim; only one reaches the gateway.
pub async fn retry_payment(
    pool: &SqlitePool,
    payment: &PaymentContext<'_>,
    id: i64,
) -> Result<WorkflowOutcome, AppError> {
    let registration = get_registration(pool, id).await?;
    let Some(gateway) = payment.gateway else {
        return Ok(WorkflowOutcome::Created);
    };
    if registration.has_payment() {
        return Err(AppError::PaymentConflict { registration_id: id });
    }
    request_payment(pool, gateway, payment.payer_email, &registration).await
}

async fn request_payment(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    payer_email: &str,
    registration: &RegistrationRow,
) -> Result<WorkflowOutcome, AppError> {
    let id = registration.id;
    let claim = Uuid::new_v4().to_string();
    let claimed_at = Utc::now().timestamp();
    let claimed = registrations_repo::claim_payment(
        pool,
        id,
        &claim,
        claimed_at,
        claimed_at - PAYMENT_CLAIM_TTL_SECS,
    )
    .await?;
    if claimed == 0 {
        info!(registration_id = id, "PIX request skipped, payment already attached or in flight");
        return Err(AppError::PaymentConflict { registration_id: id });
    }

    let request = build_pix_request(registration, payer_email);
    let intent = match gateway.create_pix_intent(&request).await {
        Ok(intent) => intent,
        Err(e) => {
            warn!(
                registration_id = id,
                error = %e,
                "PIX request failed, registration left pending without payment data"
            );
            registrations_repo::release_payment_claim(pool, id, &claim).await?;
            return Ok(WorkflowOutcome::PaymentUnavailable);
        }
    };

    attach_payment(pool, id, &intent).await?;
    Ok(WorkflowOutcome::AwaitingConfirmation(intent))
}

pub fn build_pix_request(registration: &RegistrationRow, payer_email: &str) -> PixRequest {
    PixRequest {
        amount: registration.amount(),
        description: format!(
            "Inscrição Retiro ({}) - ID {}",
            registration.sex, registration.id
        ),
        payer: PayerIdentity {
            email: payer_email.to_string(),
            first_name: first_name(&registration.name),
            cpf: digits_only(&registration.cpf),
        },
        external_reference: registration.id.to_string(),
    }
}

fn first_name(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
