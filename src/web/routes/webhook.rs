use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::services::webhook_service::{self, PaymentNotification};
use crate::web::state::AppState;

/// Gateway notification receiver.
///
/// Answers 200 once the notification has been handled (including "nothing to
/// do"), and 500 when the gateway lookup or the store fails so the sender retries.
pub async fn payment_webhook_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let notification = match serde_json::from_slice::<PaymentNotification>(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!("Unparseable payment notification ignored: {}", e);
            PaymentNotification::default()
        }
    };
    info!(action = ?notification.action, payment_id = ?notification.payment_id(), "payment notification received");

    match webhook_service::reconcile(&state.pool, state.gateway.as_deref(), &notification).await {
        Ok(outcome) => {
            info!(?outcome, "payment notification handled");
            (StatusCode::OK, "OK").into_response()
        }
        Err(e) => {
            error!(error = %e, "payment notification failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Erro").into_response()
        }
    }
}
