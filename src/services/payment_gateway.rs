//! Mercado Pago PIX adapter.
//!
//! The rest of the crate talks to [`PaymentGateway`]; the HTTP details of the
//! Mercado Pago REST API stay in [`MercadoPagoGateway`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::services::pricing::Amount;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request to payment gateway failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment gateway rejected the request with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed payment gateway response: {0}")]
    MalformedResponse(String),

    #[error("invalid access token header: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerIdentity {
    pub email: String,
    pub first_name: String,
    /// Digits only.
    pub cpf: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PixRequest {
    pub amount: Amount,
    pub description: String,
    pub payer: PayerIdentity,
    pub external_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixIntent {
    pub gateway_id: String,
    pub qr_payload: String,
    pub qr_image: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatus {
    pub approved: bool,
    pub external_reference: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a PIX payment. Every call carries a fresh idempotency key.
    async fn create_pix_intent(&self, request: &PixRequest) -> Result<PixIntent, GatewayError>;

    /// Authoritative status of a payment, used instead of trusting webhook bodies.
    async fn get_payment_status(&self, gateway_id: &str) -> Result<PaymentStatus, GatewayError>;
}

pub struct MercadoPagoGateway {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    notification_url: String,
}

impl MercadoPagoGateway {
    pub fn new(config: &GatewayConfig, notification_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            notification_url,
        }
    }

    fn bearer_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.access_token))
            .map_err(|e| GatewayError::InvalidToken(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[derive(Serialize)]
struct CreatePaymentBody<'a> {
    transaction_amount: f64,
    description: &'a str,
    payment_method_id: &'static str,
    payer: PayerBody<'a>,
    external_reference: &'a str,
    notification_url: &'a str,
}

#[derive(Serialize)]
struct PayerBody<'a> {
    email: &'a str,
    first_name: &'a str,
    identification: IdentificationBody<'a>,
}

#[derive(Serialize)]
struct IdentificationBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    number: &'a str,
}

#[derive(Deserialize)]
struct PaymentResponse {
    id: Option<Value>,
    status: Option<String>,
    external_reference: Option<Value>,
    point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Deserialize)]
struct PointOfInteraction {
    transaction_data: Option<TransactionData>,
}

#[derive(Deserialize)]
struct TransactionData {
    qr_code: Option<String>,
    qr_code_base64: Option<String>,
}

/// Mercado Pago sends ids as numbers and references as strings; accept both.
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn read_json(resp: reqwest::Response) -> Result<PaymentResponse, GatewayError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    resp.json::<PaymentResponse>()
        .await
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn create_pix_intent(&self, request: &PixRequest) -> Result<PixIntent, GatewayError> {
        let url = format!("{}/v1/payments", self.api_url);
        let idempotency_key = Uuid::new_v4().to_string();
        let body = CreatePaymentBody {
            transaction_amount: request.amount.as_reais(),
            description: &request.description,
            payment_method_id: "pix",
            payer: PayerBody {
                email: &request.payer.email,
                first_name: &request.payer.first_name,
                identification: IdentificationBody {
                    kind: "CPF",
                    number: &request.payer.cpf,
                },
            },
            external_reference: &request.external_reference,
            notification_url: &self.notification_url,
        };

        let resp = self
            .client
            .post(&url)
            .headers(self.bearer_headers()?)
            .header("X-Idempotency-Key", idempotency_key.as_str())
            .json(&body)
            .send()
            .await?;
        let payment = read_json(resp).await?;

        let gateway_id = payment
            .id
            .as_ref()
            .and_then(value_to_id)
            .ok_or_else(|| GatewayError::MalformedResponse("missing payment id".into()))?;
        let data = payment
            .point_of_interaction
            .and_then(|p| p.transaction_data)
            .ok_or_else(|| GatewayError::MalformedResponse("missing transaction_data".into()))?;
        let (Some(qr_payload), Some(qr_image)) = (data.qr_code, data.qr_code_base64) else {
            warn!(gateway_id = %gateway_id, "PIX payment created without QR data");
            return Err(GatewayError::MalformedResponse("missing PIX QR data".into()));
        };

        info!(
            gateway_id = %gateway_id,
            external_reference = %request.external_reference,
            idempotency_key = %idempotency_key,
            "PIX payment created"
        );
        Ok(PixIntent {
            gateway_id,
            qr_payload,
            qr_image,
        })
    }

    async fn get_payment_status(&self, gateway_id: &str) -> Result<PaymentStatus, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.api_url, gateway_id);
        let resp = self
            .client
            .get(&url)
            .headers(self.bearer_headers()?)
            .send()
            .await?;
        let payment = read_json(resp).await?;

        Ok(PaymentStatus {
            approved: payment.status.as_deref() == Some("approved"),
            external_reference: payment.external_reference.as_ref().and_then(value_to_id),
        })
    }
}
