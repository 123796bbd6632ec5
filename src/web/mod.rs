pub mod middleware;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use routes::{admin, auth, home, registration, webhook};
use state::AppState;

pub fn router(state: AppState) -> Router {
    // Everything under /admin sits behind the session guard.
    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard_handler))
        .route(
            "/admin/galeria/adicionar",
            post(admin::gallery_add_handler)
                .layer(DefaultBodyLimit::max(state.config.upload_max_bytes)),
        )
        .route(
            "/admin/galeria/deletar/:id",
            get(admin::gallery_delete_handler),
        )
        .route(
            "/admin/editar/:id",
            get(admin::edit_page_handler).post(admin::edit_submit_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .route("/", get(home::home_handler))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/logout", get(auth::logout_handler))
        .route("/inscrever", post(registration::register_handler))
        .route("/status/:id", get(registration::status_page_handler))
        .route(
            "/status/:id/pagamento",
            post(registration::retry_payment_handler),
        )
        .route(
            "/api/check-status/:id",
            get(registration::check_status_handler),
        )
        .route("/webhook/pagamento", post(webhook::payment_webhook_handler))
        .merge(admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .nest_service("/public", ServeDir::new("public"))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
