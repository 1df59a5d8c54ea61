//! JSON interaction API used by the login / consent UI.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::AuthError;
use crate::grants::TokenErrorBody;
use crate::interaction::InteractionResult;
use crate::provider::Provider;

/// `GET /auth/{uid}`
pub async fn interaction_details(
    State(provider): State<Arc<Provider>>,
    Path(uid): Path<String>,
) -> Response {
    match provider.interaction_details(&uid).await {
        Ok(details) => Json(details).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `POST /auth/{uid}` with an [`InteractionResult`] body; redirects to the
/// resume endpoint.
pub async fn interaction_finished(
    State(provider): State<Arc<Provider>>,
    Path(uid): Path<String>,
    Json(result): Json<InteractionResult>,
) -> Response {
    match provider.interaction_finished(&uid, result).await {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &AuthError) -> Response {
    let status = if err.is_server_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(TokenErrorBody::from(err))).into_response()
}
