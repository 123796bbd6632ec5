use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::AppError;
use crate::models::{RegistrationRow, RegistrationStatus};
use crate::services::registration_service::{self, RegistrationForm, WorkflowOutcome};
use crate::web::render::render_page;
use crate::web::state::AppState;

#[derive(Template)]
#[template(path = "status.html")]
pub struct StatusTemplate {
    pub registration: RegistrationRow,
    pub is_paid: bool,
    pub can_retry_payment: bool,
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Redirect, AppError> {
    let registered = registration_service::register(
        &state.pool,
        &state.config.pricing,
        &state.payment_context(),
        &form,
        Utc::now(),
    )
    .await?;

    if registered.outcome == WorkflowOutcome::PaymentUnavailable {
        warn!(registration_id = registered.id, "registration stored without PIX data");
    }
    Ok(Redirect::to(&status_path(registered.id)))
}

pub async fn status_page_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = super::parse_id(&raw_id)?;
    let registration = registration_service::get_registration(&state.pool, id).await?;
    let is_paid = registration.status() == RegistrationStatus::Paid;
    let can_retry_payment = state.gateway.is_some() && !registration.has_payment() && !is_paid;

    Ok(render_page(&StatusTemplate {
        registration,
        is_paid,
        can_retry_payment,
    }))
}

/// Polled by the status page. Any failure, including an unknown id, reads as `Erro`.
pub async fn check_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Value> {
    let Ok(id) = super::parse_id(&id) else {
        return Json(json!({ "status": "Erro" }));
    };

    match registration_service::get_registration(&state.pool, id).await {
        Ok(registration) => Json(json!({ "status": registration.status() })),
        Err(AppError::NotFound) => Json(json!({ "status": "Erro" })),
        Err(e) => {
            warn!(registration_id = id, "Status check failed: {}", e);
            Json(json!({ "status": "Erro" }))
        }
    }
}

/// Second chance at the PIX request when the first gateway call failed.
pub async fn retry_payment_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = super::parse_id(&raw_id)?;
    match registration_service::retry_payment(&state.pool, &state.payment_context(), id).await {
        Ok(_) | Err(AppError::PaymentConflict { .. }) => {
            Ok(Redirect::to(&status_path(id)).into_response())
        }
        Err(e) => Err(e),
    }
}

fn status_path(id: i64) -> String {
    format!("/status/{}", id)
}
