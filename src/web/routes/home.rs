use askama::Template;
use axum::{extract::State, response::Response};
use chrono::Utc;
use tracing::warn;

use crate::models::GalleryItemRow;
use crate::services::gallery_service;
use crate::web::render::render_page;
use crate::web::state::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub price: String,
    pub cutoff: String,
    pub gallery: Vec<GalleryItemRow>,
}

/// Landing page. A gallery failure still renders the page with the price.
pub async fn home_handler(State(state): State<AppState>) -> Response {
    let pricing = &state.config.pricing;
    let gallery = gallery_service::list_gallery(&state.pool)
        .await
        .unwrap_or_else(|e| {
            warn!("Gallery load failed: {}", e);
            vec![]
        });

    let template = IndexTemplate {
        price: pricing.current_price(Utc::now()).to_string(),
        cutoff: pricing.cutoff_label(),
        gallery,
    };
    render_page(&template)
}
