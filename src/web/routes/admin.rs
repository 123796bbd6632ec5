use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Redirect, Response},
    Extension, Form,
};
use chrono::Utc;
use tracing::warn;

use crate::error::AppError;
use crate::models::{GalleryItemRow, GalleryKind, RegistrationRow, RegistrationStatus};
use crate::services::dashboard_service::{self, DashboardQuery, DashboardStats, EditRegistrationForm};
use crate::services::gallery_service::{self, NewUpload};
use crate::services::registration_service;
use crate::web::render::render_page;
use crate::web::session::AdminSession;
use crate::web::state::AppState;

pub struct StatusOption {
    pub value: &'static str,
    pub selected: bool,
}

fn status_options(current: Option<RegistrationStatus>) -> Vec<StatusOption> {
    RegistrationStatus::ALL
        .iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            selected: Some(*s) == current,
        })
        .collect()
}

#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub registrations: Vec<RegistrationRow>,
    pub gallery: Vec<GalleryItemRow>,
    pub stats: DashboardStats,
    pub filter_options: Vec<StatusOption>,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub registration: RegistrationRow,
    pub status_options: Vec<StatusOption>,
}

pub async fn dashboard_handler(
    Extension(_admin): Extension<AdminSession>,
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let data = dashboard_service::load_dashboard(&state.pool, query.status_filter()).await?;

    Ok(render_page(&AdminTemplate {
        registrations: data.registrations,
        gallery: data.gallery,
        stats: data.stats,
        filter_options: status_options(data.filter),
    }))
}

pub async fn edit_page_handler(
    Extension(_admin): Extension<AdminSession>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = super::parse_id(&raw_id)?;
    let registration = registration_service::get_registration(&state.pool, id).await?;
    let status_options = status_options(Some(registration.status()));

    Ok(render_page(&EditTemplate {
        registration,
        status_options,
    }))
}

pub async fn edit_submit_handler(
    Extension(_admin): Extension<AdminSession>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Form(form): Form<EditRegistrationForm>,
) -> Result<Redirect, AppError> {
    let id = super::parse_id(&raw_id)?;
    dashboard_service::edit_registration(&state.pool, id, &form).await?;
    Ok(Redirect::to("/admin"))
}

/// Multipart fields: `arquivo` (file), `tipo`, `titulo`. No file means no change.
pub async fn gallery_add_handler(
    Extension(_admin): Extension<AdminSession>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut kind_raw = String::new();
    let mut title = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "arquivo" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;
                if !file_name.is_empty() || !bytes.is_empty() {
                    file = Some((file_name, bytes.to_vec()));
                }
            }
            "tipo" => {
                kind_raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;
            }
            "titulo" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| AppError::Upload(e.to_string()))?;
            }
            other => warn!("Ignoring unexpected upload field {:?}", other),
        }
    }

    let Some((original_name, bytes)) = file else {
        return Ok(Redirect::to("/admin"));
    };
    let kind = if kind_raw.trim().is_empty() {
        GalleryKind::Image
    } else {
        kind_raw.parse().map_err(AppError::BadRequest)?
    };

    gallery_service::add_gallery_item(
        &state.pool,
        &state.config.upload_dir,
        NewUpload {
            kind,
            title: &title,
            original_name: &original_name,
            bytes: &bytes,
        },
        Utc::now(),
    )
    .await?;
    Ok(Redirect::to("/admin"))
}

pub async fn gallery_delete_handler(
    Extension(_admin): Extension<AdminSession>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = super::parse_id(&raw_id)?;
    gallery_service::delete_gallery_item(&state.pool, id).await?;
    Ok(Redirect::to("/admin"))
}
