//! Issuance for admitted authorization requests.
//!
//! Each word of the response type contributes its artifact: `code` an
//! authorization code, `token` an access token, `id_token` a signed ID token
//! (with `c_hash` / `at_hash` for artifacts issued alongside). `none`
//! contributes nothing but `state` and `session_state`.

use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use super::context::AuthorizationContext;
use super::response::{EndpointResponse, deliver};
use crate::AuthResult;
use crate::cookies::CookieOptions;
use crate::error::AuthError;
use crate::interaction::Session;
use crate::oauth::{PkceChallenge, PkceChallengeMethod};
use crate::provider::Provider;
use crate::storage::AudienceTarget;
use crate::token::{AccessToken, AuthContext, AuthorizationCode, IdToken, TokenStore};

/// Issues the artifacts requested by `ctx` for the session's account and
/// delivers them to the client.
///
/// Saves the session (the per-client authorization may be new) and sets the
/// `_state.<client_id>` cookie.
///
/// # Errors
///
/// Returns an error if the PKCE parameters are invalid, the account cannot
/// be resolved, or a token cannot be saved or signed.
pub(crate) async fn issue(
    provider: &Provider,
    ctx: &AuthorizationContext,
    session: &mut Session,
) -> AuthResult<EndpointResponse> {
    let config = provider.config();
    let client = ctx.client()?;
    let raw_response_type = ctx.params.response_type.as_deref().unwrap_or_default();
    let response_type = ctx
        .response_type()
        .ok_or_else(|| AuthError::unsupported_response_type(raw_response_type))?;
    let account_id = session
        .account_id
        .clone()
        .ok_or_else(|| AuthError::login_required("End-User authentication is required"))?;
    let account = provider
        .accounts()
        .find_account(&account_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(account_id = %account_id, "session account not found");
            AuthError::login_required("End-User authentication is required")
        })?;
    let redirect_uri = ctx.params.redirect_uri.clone().unwrap_or_default();

    let pkce = match ctx.params.code_challenge.as_deref() {
        Some(challenge) if response_type.has_code() => Some((
            PkceChallenge::new(challenge)?,
            PkceChallengeMethod::parse(ctx.params.code_challenge_method.as_deref())?,
        )),
        _ => None,
    };

    let mut scope = ctx.params.scope();
    if !(response_type.has_code() && ctx.params.has_prompt("consent")) {
        scope = scope.without("offline_access");
    }
    let scope = scope.to_string();

    let authorization = session.authorization_for(&client.client_id);
    authorization.scope = Some(scope.clone());
    let sid = authorization.sid.clone();
    let grant_id = authorization.grant_id.clone();
    let browser_state = authorization.browser_state.clone();

    let auth = AuthContext {
        account_id: Some(account_id.clone()),
        acr: session.acr.clone(),
        amr: session.amr.clone(),
        aud: None,
        auth_time: session.auth_time,
        claims: ctx.params.claims_request(),
        grant_id: Some(grant_id),
        nonce: ctx.params.nonce.clone(),
        scope: Some(scope.clone()),
        sid: Some(sid),
    };

    let mut params: Vec<(String, String)> = Vec::new();
    let mut code_value = None;
    let mut access_token_value = None;

    if response_type.has_code() {
        let mut code = AuthorizationCode::new(
            &client.client_id,
            config.ttl.authorization_code,
            auth.clone(),
            redirect_uri.as_str(),
        );
        if let Some((challenge, method)) = &pkce {
            code.code_challenge = Some(challenge.as_str().to_string());
            code.code_challenge_method = Some(method.as_str().to_string());
        }
        let value = TokenStore::<AuthorizationCode>::new(provider.adapters())
            .save(&mut code)
            .await?;
        params.push(("code".to_string(), value.clone()));
        code_value = Some(value);
    }

    if response_type.has_token() {
        let aud = provider
            .audiences_for(client, AudienceTarget::AccessToken, &scope, Some(&account_id))
            .await?;
        let mut token = AccessToken::new(
            &client.client_id,
            config.ttl.access_token,
            AuthContext {
                aud: (!aud.is_empty()).then_some(aud),
                ..auth.clone()
            },
        );
        let value = TokenStore::<AccessToken>::new(provider.adapters())
            .save(&mut token)
            .await?;
        params.push(("access_token".to_string(), value.clone()));
        params.push(("expires_in".to_string(), token.base.expires_in().to_string()));
        params.push(("token_type".to_string(), "Bearer".to_string()));
        access_token_value = Some(value);
    }

    if response_type.has_id_token() {
        let audiences = provider
            .audiences_for(client, AudienceTarget::IdToken, &scope, Some(&account_id))
            .await?;

        let mut id_token = IdToken::new(account, auth);
        if let Some(code) = &code_value {
            id_token = id_token.with_code(code.as_str());
        }
        if let Some(access_token) = &access_token_value {
            id_token = id_token.with_access_token(access_token.as_str());
        }
        let signed = id_token.sign(client, &audiences, &provider.id_token_signing())?;
        params.push(("id_token".to_string(), signed));
    }

    if let Some(state) = &ctx.params.state {
        params.push(("state".to_string(), state.clone()));
    }
    params.push((
        "session_state".to_string(),
        session_state(&client.client_id, &redirect_uri, &browser_state),
    ));

    provider.sessions().save(session).await?;

    let state_cookie = format!("{}.{}", config.cookies.state_name, client.client_id);
    let options = CookieOptions {
        http_only: false,
        expires: (!session.transient).then(|| session.expires()),
        ..CookieOptions::transient("/")
    };
    let cookies = provider
        .cookies()
        .write(&state_cookie, &browser_state, &options)
        .map_err(|e| AuthError::internal(e.to_string()))?;

    tracing::info!(
        client_id = %client.client_id,
        response_type = %response_type,
        "authorization response issued"
    );

    let body = deliver(&redirect_uri, ctx.response_mode(), params)?;
    Ok(EndpointResponse::new(body).with_cookies(cookies))
}

/// OpenID Connect session management value:
/// `sha256(client_id origin browser_state salt).salt`.
#[must_use]
pub fn session_state(client_id: &str, redirect_uri: &str, browser_state: &str) -> String {
    let salt = hex::encode(rand::thread_rng().r#gen::<[u8; 8]>());
    session_state_with_salt(client_id, redirect_uri, browser_state, &salt)
}

fn session_state_with_salt(
    client_id: &str,
    redirect_uri: &str,
    browser_state: &str,
    salt: &str,
) -> String {
    let origin = Url::parse(redirect_uri)
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_default();
    let digest = Sha256::digest(format!("{client_id} {origin} {browser_state} {salt}").as_bytes());
    format!("{}.{salt}", hex::encode(digest))
}
