//! The authorization endpoint.

use super::checks::{ChainEnv, ValidationChain};
use super::context::AuthorizationContext;
use super::issue::issue;
use super::params::AuthorizationParams;
use super::response::{EndpointResponse, error_response};
use crate::AuthResult;
use crate::cookies::RequestCookies;
use crate::error::AuthError;
use crate::interaction::{self, required_prompts};
use crate::provider::Provider;

/// Validates, admits and answers an authorization request.
///
/// Never fails: every error becomes a redirect to a trusted client target or
/// a local error page.
pub(crate) async fn authorize(
    provider: &Provider,
    params: AuthorizationParams,
    cookies: &RequestCookies,
) -> EndpointResponse {
    let mut ctx = AuthorizationContext::new(params);
    let env = ChainEnv {
        config: provider.config(),
        clients: provider.clients(),
    };

    if let Err(err) = ValidationChain::authorization().run(&mut ctx, &env).await {
        return reject(&ctx, &err);
    }

    match admit(provider, &ctx, cookies).await {
        Ok(response) => response,
        Err(err) => reject(&ctx, &err),
    }
}

/// Evaluates prompts against the session: suspends for interaction, fails
/// `prompt=none` requests, or issues.
async fn admit(
    provider: &Provider,
    ctx: &AuthorizationContext,
    cookies: &RequestCookies,
) -> AuthResult<EndpointResponse> {
    let session_id = provider
        .cookies()
        .read(cookies, &provider.config().cookies.session_name);
    let mut session = provider.sessions().load(session_id).await?;

    let prompts = required_prompts(&ctx.params, &session, Provider::now());
    if let Some(first) = prompts.first() {
        if ctx.params.has_prompt("none") {
            return Err(first.none_error());
        }
        return interaction::suspend(provider, ctx, &session, &prompts).await;
    }

    issue(provider, ctx, &mut session).await
}

/// Renders `err` for the request in `ctx`.
pub(crate) fn reject(ctx: &AuthorizationContext, err: &AuthError) -> EndpointResponse {
    let client_id = ctx.params.client_id.as_deref().unwrap_or_default();
    if err.is_server_error() {
        tracing::error!(client_id, error = %err, "authorization request failed");
    } else if err.is_interaction_error() {
        tracing::info!(
            client_id,
            error = err.oauth_error_code(),
            "authorization request needs end-user interaction"
        );
    } else {
        tracing::warn!(
            client_id,
            error = err.oauth_error_code(),
            category = %err.category(),
            "authorization request rejected"
        );
    }
    error_response(ctx.redirect_target(err), err)
}
