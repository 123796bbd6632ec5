use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::services::payment_gateway::GatewayError;
use crate::web::render::render_error_page;

const GENERIC_FAILURE: &str = "Ocorreu um erro ao processar sua solicitação. Tente novamente.";

/// Failures surfaced at the route boundary.
///
/// Categories stay distinct for logging; the visitor only ever sees a generic
/// message (or "not found").
#[derive(Error, Debug)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("record not found")]
    NotFound,

    #[error("registration {registration_id} already has a different payment attached")]
    PaymentConflict { registration_id: i64 },

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload failed: {0}")]
    Upload(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Não encontrado."),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, GENERIC_FAILURE),
            AppError::PaymentConflict { .. } => (StatusCode::CONFLICT, GENERIC_FAILURE),
            AppError::Storage(_) | AppError::Gateway(_) | AppError::Upload(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
            }
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }

        (status, render_error_page(message)).into_response()
    }
}
