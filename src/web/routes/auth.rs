use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use cookie::Cookie;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::web::render::render_page;
use crate::web::session;
use crate::web::state::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: bool,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default, rename = "senha")]
    password: String,
}

pub async fn login_page() -> Response {
    render_page(&LoginTemplate { error: false })
}

// Plain comparison against the configured shared password; there are no per-user accounts.
pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if form.password != state.config.admin_password {
        warn!("Admin login rejected");
        return Ok(render_page(&LoginTemplate { error: true }));
    }

    let admin = session::start_session(&state.pool, Utc::now()).await?;
    info!("Admin login accepted");
    Ok(with_cookie(
        Redirect::to("/admin").into_response(),
        session::issue_session_cookie(&state.session_key, &admin),
    ))
}

/// Revokes the presented session, if it is still readable, and clears the cookie.
pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(admin) = session::read_admin_session(&headers, &state.session_key, Utc::now()) {
        match session::end_session(&state.pool, &admin).await {
            Ok(()) => info!("Admin logged out"),
            Err(e) => error!("Failed to revoke admin session: {}", e),
        }
    }

    with_cookie(
        Redirect::to("/login").into_response(),
        session::clear_session_cookie(),
    )
}

fn with_cookie(mut response: Response, cookie: Cookie<'static>) -> Response {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => error!("Session cookie is not a valid header value: {}", e),
    }
    response
}
