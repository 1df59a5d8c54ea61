//! Authorization endpoint handlers.

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use axum::response::Response;
use axum_extra::extract::CookieJar;

use super::{into_http, request_cookies};
use crate::authorization::{AuthorizationParams, EndpointResponse};
use crate::error::AuthError;
use crate::provider::Provider;

/// `GET /auth`
pub async fn authorize_get(
    State(provider): State<Arc<Provider>>,
    jar: CookieJar,
    params: Result<Query<AuthorizationParams>, QueryRejection>,
) -> Response {
    match params {
        Ok(Query(params)) => authorize(&provider, jar, params).await,
        Err(rejection) => malformed(jar, &rejection.body_text()),
    }
}

/// `POST /auth` with a form body.
pub async fn authorize_post(
    State(provider): State<Arc<Provider>>,
    jar: CookieJar,
    params: Result<Form<AuthorizationParams>, FormRejection>,
) -> Response {
    match params {
        Ok(Form(params)) => authorize(&provider, jar, params).await,
        Err(rejection) => malformed(jar, &rejection.body_text()),
    }
}

/// `GET /auth/resume`
pub async fn resume(State(provider): State<Arc<Provider>>, jar: CookieJar) -> Response {
    let cookies = request_cookies(&jar);
    let response = provider.resume(&cookies).await;
    into_http(jar, response)
}

async fn authorize(provider: &Provider, jar: CookieJar, params: AuthorizationParams) -> Response {
    let cookies = request_cookies(&jar);
    let response = provider.authorize(params, &cookies).await;
    into_http(jar, response)
}

/// Unparseable parameters (e.g. repeated ones) are reported locally.
fn malformed(jar: CookieJar, reason: &str) -> Response {
    tracing::warn!(reason, "malformed authorization request");
    let err = AuthError::invalid_request(format!("invalid authorization request ({reason})"));
    into_http(jar, EndpointResponse::local_error(&err))
}
