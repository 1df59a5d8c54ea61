//! Token endpoint handler.
//!
//! ```text
//! POST /token
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <base64(client_id:client_secret)>
//!
//! grant_type=authorization_code
//! &code=SplxlOBeZQQYbYS6WxSbIA
//! &redirect_uri=https://rp.example.com/cb
//! ```

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::AuthError;
use crate::grants::{TokenErrorBody, TokenRequest, TokenResponse};
use crate::oauth::PresentedCredentials;
use crate::provider::Provider;

/// `POST /token`
pub async fn token_handler(
    State(provider): State<Arc<Provider>>,
    headers: HeaderMap,
    request: Result<Form<TokenRequest>, FormRejection>,
) -> Response {
    let Form(request) = match request {
        Ok(form) => form,
        Err(rejection) => {
            return token_error_response(&AuthError::invalid_request(rejection.body_text()));
        }
    };

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let credentials = PresentedCredentials::from_request(
        authorization,
        request.param("client_id"),
        request.param("client_secret"),
    );

    match provider.token(request, credentials).await {
        Ok(response) => token_success_response(response),
        Err(err) => token_error_response(&err),
    }
}

fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(response),
    )
        .into_response()
}

fn token_error_response(err: &AuthError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    let mut response = (
        status,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(TokenErrorBody::from(err)),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"tessera\""),
        );
    }
    response
}
