use std::sync::Arc;

use axum::extract::FromRef;
use cookie::Key;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::payment_gateway::{MercadoPagoGateway, PaymentGateway};
use crate::services::registration_service::PaymentContext;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    pub session_key: Key,
}

impl AppState {
    /// Builds the Mercado Pago gateway when an access token is configured.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let gateway = config.gateway.as_ref().map(|g| {
            Arc::new(MercadoPagoGateway::new(g, config.notification_url())) as Arc<dyn PaymentGateway>
        });
        Self::with_gateway(pool, config, gateway)
    }

    pub fn with_gateway(
        pool: SqlitePool,
        config: Config,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let session_key = Key::derive_from(config.session_secret.as_bytes());
        Self {
            pool,
            config: Arc::new(config),
            gateway,
            session_key,
        }
    }

    pub fn payment_context(&self) -> PaymentContext<'_> {
        PaymentContext {
            gateway: self.gateway.as_deref(),
            payer_email: &self.config.payer_email,
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
