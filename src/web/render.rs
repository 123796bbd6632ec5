use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    message: &'a str,
}

pub fn render_page<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno.").into_response()
        }
    }
}

pub fn render_error_page(message: &str) -> Html<String> {
    let template = ErrorTemplate { message };
    Html(template.render().unwrap_or_else(|_| message.to_string()))
}
