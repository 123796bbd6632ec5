use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tracing::{debug, error};

use crate::web::session;
use crate::web::state::AppState;

/// Gate for `/admin*`: lets signed, unexpired, not-logged-out sessions through with an
/// [`session::AdminSession`] extension, redirects everything else to `/login` before
/// the handler runs.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let now = Utc::now();
    if let Some(admin) = session::read_admin_session(request.headers(), &state.session_key, now) {
        match session::is_active(&state.pool, &admin, now).await {
            Ok(true) => {
                request.extensions_mut().insert(admin);
                return next.run(request).await;
            }
            Ok(false) => debug!("admin session revoked or expired"),
            Err(e) => error!("Failed to look up admin session: {}", e),
        }
    }

    debug!(path = %request.uri().path(), "unauthenticated admin request");
    Redirect::to("/login").into_response()
}
