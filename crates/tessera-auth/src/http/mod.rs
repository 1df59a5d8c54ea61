//! axum adapter.
//!
//! # Routes
//!
//! - `GET|POST /auth` - authorization endpoint
//! - `GET /auth/resume` - resume after interaction (the configured resume path)
//! - `GET /auth/{uid}` - interaction details (JSON)
//! - `POST /auth/{uid}` - finish an interaction with a JSON result
//! - `POST /token` - token endpoint

pub mod authorize;
pub mod interaction;
pub mod token;

use std::sync::Arc;

use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;

use crate::authorization::{EndpointResponse, ResponseBody, render_error_page, render_form_post};
use crate::cookies::RequestCookies;
use crate::provider::Provider;

pub use authorize::{authorize_get, authorize_post, resume};
pub use interaction::{interaction_details, interaction_finished};
pub use token::token_handler;

/// Builds the provider's router.
pub fn router(provider: Arc<Provider>) -> Router {
    let resume_path = provider.config().cookies.resume_path.clone();
    Router::new()
        .route("/auth", get(authorize_get).post(authorize_post))
        .route(&resume_path, get(resume))
        .route(
            "/auth/{uid}",
            get(interaction_details).post(interaction_finished),
        )
        .route("/token", post(token_handler))
        .with_state(provider)
}

/// Cookies presented with the request.
pub(crate) fn request_cookies(jar: &CookieJar) -> RequestCookies {
    jar.iter()
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

/// Turns an engine response into an HTTP response, setting its cookies.
pub(crate) fn into_http(jar: CookieJar, response: EndpointResponse) -> Response {
    let jar = response
        .cookies
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie));

    match response.body {
        ResponseBody::Redirect { location } => (
            StatusCode::FOUND,
            jar,
            [(header::LOCATION, location)],
        )
            .into_response(),
        ResponseBody::FormPost { action, params } => (
            StatusCode::OK,
            jar,
            [(header::CACHE_CONTROL, "no-store")],
            Html(render_form_post(&action, &params)),
        )
            .into_response(),
        ResponseBody::LocalError {
            status,
            error,
            description,
        } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST),
            jar,
            Html(render_error_page(&error, &description)),
        )
            .into_response(),
    }
}
