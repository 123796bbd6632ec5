#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

use retiro::config::Config;
use retiro::database::schema;
use retiro::services::payment_gateway::{
    GatewayError, PaymentGateway, PaymentStatus, PixIntent, PixRequest,
};
use retiro::services::pricing::{Amount, PricingPolicy};
use retiro::services::registration_service::RegistrationForm;
use retiro::web::{self, session, state::AppState};

pub const ADMIN_PASSWORD: &str = "senha-de-teste";
pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";

/// Single connection so every query sees the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should open");
    schema::ensure_schema(&pool)
        .await
        .expect("schema should be created");
    pool
}

pub fn test_pricing() -> PricingPolicy {
    PricingPolicy {
        cutoff: DateTime::parse_from_rfc3339("2025-01-20T23:59:59-03:00").unwrap(),
        tier1: Amount::from_cents(10_000),
        tier2: Amount::from_cents(15_000),
    }
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_password: ADMIN_PASSWORD.to_string(),
        session_secret: SESSION_SECRET.to_string(),
        base_url: "https://retiro.example.com".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        upload_max_bytes: 1024 * 1024,
        payer_email: "participante@retiro.com".to_string(),
        gateway: None,
        pricing: test_pricing(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: SqlitePool,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new(gateway: Option<Arc<FakeGateway>>) -> Self {
        let pool = test_pool().await;
        let upload_dir = tempfile::tempdir().expect("temp upload dir");
        let gateway = gateway.map(|g| g as Arc<dyn PaymentGateway>);
        let state = AppState::with_gateway(pool.clone(), test_config(upload_dir.path()), gateway);
        Self {
            router: web::router(state.clone()),
            state,
            pool,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// `Cookie` header value of a valid, stored admin session.
    pub async fn admin_cookie(&self) -> String {
        let admin = session::start_session(&self.pool, Utc::now())
            .await
            .expect("session should be stored");
        session::issue_session_cookie(&self.state.session_key, &admin)
            .stripped()
            .to_string()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "expected a redirect");
    assert_eq!(location(response), to);
}

pub fn sample_form(name: &str, sex: &str) -> RegistrationForm {
    RegistrationForm {
        name: name.to_string(),
        cpf: "123.456.789-01".to_string(),
        sex: sex.to_string(),
        congregation: "Central".to_string(),
        phone: "(11) 99999-0000".to_string(),
    }
}

pub const SAMPLE_FORM_BODY: &str =
    "nome=Maria+da+Silva&cpf=123.456.789-01&sexo=Feminino&congregacao=Central&telefone=11999990000";

/// Scriptable stand-in for Mercado Pago.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<PixRequest>>,
    pub statuses: Mutex<HashMap<String, PaymentStatus>>,
    pub fail_create: AtomicBool,
    pub fail_status: AtomicBool,
    pub status_queries: AtomicUsize,
    /// Milliseconds each PIX creation waits before answering.
    pub create_delay_ms: AtomicU64,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, gateway_id: &str, approved: bool, external_reference: Option<&str>) {
        self.statuses.lock().unwrap().insert(
            gateway_id.to_string(),
            PaymentStatus {
                approved,
                external_reference: external_reference.map(str::to_string),
            },
        );
    }

    pub fn requests(&self) -> Vec<PixRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub fn intent_for(external_reference: &str, n: usize) -> PixIntent {
        PixIntent {
            gateway_id: format!("mp-{n}"),
            qr_payload: format!("00020126-pix-{external_reference}"),
            qr_image: format!("iVBORw0KGgo-{external_reference}"),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_pix_intent(&self, request: &PixRequest) -> Result<PixIntent, GatewayError> {
        let delay = self.create_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 401,
                body: "invalid access token".to_string(),
            });
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(Self::intent_for(&request.external_reference, requests.len()))
    }

    async fn get_payment_status(&self, gateway_id: &str) -> Result<PaymentStatus, GatewayError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.statuses
            .lock()
            .unwrap()
            .get(gateway_id)
            .cloned()
            .ok_or(GatewayError::Rejected {
                status: 404,
                body: "payment not found".to_string(),
            })
    }
}
