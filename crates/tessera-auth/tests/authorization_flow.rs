//! End-to-end authorization flows through the provider: validation,
//! interaction suspension, resumption and issuance.

mod common;

use std::time::Duration;

use common::{
    Browser, CLIENT_ID, REDIRECT_URI, authorize_through, basic_credentials, id_token_claims,
    local_error, params, provider, provider_with, redirect_params,
};
use tessera_auth::interaction::InteractionResult;
use tessera_auth::token::{AccessToken, FindOptions, TokenStore};
use tessera_auth::{AuthError, AuthorizationParams, TokenRequest};

fn code_exchange(code: &str) -> TokenRequest {
    TokenRequest {
        grant_type: Some("authorization_code".to_string()),
        code: Some(code.to_string()),
        redirect_uri: Some(REDIRECT_URI.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn code_flow_with_login_and_consent() {
    let provider = provider();
    let mut browser = Browser::default();
    let mut request = params("code", "openid");
    request.prompt = Some("consent".to_string());

    let response = provider.authorize(request, &browser.cookies()).await;
    browser.absorb(&response);
    let location = response.location().expect("redirect to interaction");
    let uid = location.strip_prefix("/auth/").expect("interaction url");
    assert!(browser.has("_grant"));
    assert!(browser.has("_grant.sig"));

    let details = provider.interaction_details(uid).await.expect("details");
    assert_eq!(details.prompts, vec!["login", "consent"]);
    assert_eq!(details.client_id.as_deref(), Some(CLIENT_ID));

    provider
        .interaction_finished(uid, InteractionResult::login("alice").with_consent(None))
        .await
        .expect("finish");
    let response = provider.resume(&browser.cookies()).await;
    browser.absorb(&response);

    assert!(!browser.has("_grant"));
    assert!(browser.has("_session"));
    assert!(browser.has(&format!("_state.{CLIENT_ID}")));

    let delivered = redirect_params(&response);
    assert_eq!(delivered["state"], "af0ifjsldkj");
    assert!(delivered["session_state"].contains('.'));
    let code = delivered["code"].clone();

    let token = provider
        .token(code_exchange(&code), basic_credentials())
        .await
        .expect("exchange code");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.scope, "openid");
    assert!(token.refresh_token.is_none());

    let claims = id_token_claims(&provider, token.id_token.as_deref().expect("id_token"));
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.aud, vec![CLIENT_ID.to_string()]);
    assert_eq!(claims.nonce.as_deref(), Some("n-0S6_WzA2Mj"));

    let replay = provider
        .token(code_exchange(&code), basic_credentials())
        .await
        .unwrap_err();
    assert_eq!(replay.oauth_error_code(), "invalid_grant");
}

#[tokio::test]
async fn implicit_flow_drops_offline_access() {
    let provider = provider();
    let mut browser = Browser::default();

    let response = authorize_through(
        &provider,
        &mut browser,
        params("id_token token", "openid offline_access"),
        InteractionResult::login("alice"),
    )
    .await;

    let delivered = redirect_params(&response);
    assert!(!delivered.contains_key("refresh_token"));
    assert!(!delivered.contains_key("code"));
    assert_eq!(delivered["token_type"], "Bearer");
    assert!(delivered.contains_key("id_token"));

    let stored = TokenStore::<AccessToken>::new(provider.adapters())
        .find(&delivered["access_token"], FindOptions::default())
        .await
        .expect("lookup")
        .expect("stored access token");
    assert_eq!(stored.auth.scope.as_deref(), Some("openid"));

    let claims = id_token_claims(&provider, &delivered["id_token"]);
    assert!(claims.at_hash.is_some());
}

#[tokio::test]
async fn established_session_issues_without_interaction() {
    let provider = provider();
    let mut browser = Browser::default();

    let resume_started = time::OffsetDateTime::now_utc().unix_timestamp();
    let first = authorize_through(
        &provider,
        &mut browser,
        params("code", "openid"),
        InteractionResult::login("alice"),
    )
    .await;
    let resume_finished = time::OffsetDateTime::now_utc().unix_timestamp();
    let code = redirect_params(&first)["code"].clone();
    let token = provider
        .token(code_exchange(&code), basic_credentials())
        .await
        .expect("exchange");
    let first_auth_time = id_token_claims(&provider, token.id_token.as_deref().expect("id_token"))
        .auth_time
        .expect("auth_time");

    assert!(
        (resume_started..=resume_finished).contains(&first_auth_time),
        "auth_time {first_auth_time} outside {resume_started}..={resume_finished}"
    );

    let second = provider
        .authorize(params("code", "openid"), &browser.cookies())
        .await;
    let code = redirect_params(&second)["code"].clone();
    let token = provider
        .token(code_exchange(&code), basic_credentials())
        .await
        .expect("exchange");
    let claims = id_token_claims(&provider, token.id_token.as_deref().expect("id_token"));
    assert_eq!(claims.auth_time, Some(first_auth_time));
}

#[tokio::test]
async fn prompt_none_without_session_is_redirected_error() {
    let provider = provider();
    let mut request = params("code", "openid");
    request.prompt = Some("none".to_string());

    let response = provider.authorize(request, &Browser::default().cookies()).await;
    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "login_required");
    assert_eq!(delivered["state"], "af0ifjsldkj");
}

#[tokio::test]
async fn remember_sets_persistent_session_cookie() {
    let provider = provider();

    let mut browser = Browser::default();
    let response = authorize_through(
        &provider,
        &mut browser,
        params("code", "openid"),
        InteractionResult::login("alice").remember(),
    )
    .await;
    let session = response
        .cookies
        .iter()
        .find(|c| c.name() == "_session")
        .expect("session cookie");
    assert!(session.expires_datetime().is_some());

    let mut browser = Browser::default();
    let response = authorize_through(
        &provider,
        &mut browser,
        params("code", "openid"),
        InteractionResult::login("alice"),
    )
    .await;
    let session = response
        .cookies
        .iter()
        .find(|c| c.name() == "_session")
        .expect("session cookie");
    assert!(session.expires().is_none());
}

#[tokio::test]
async fn unresolved_consent_is_reported() {
    let provider = provider();
    let mut browser = Browser::default();
    let mut request = params("code", "openid");
    request.prompt = Some("consent".to_string());

    let response = authorize_through(
        &provider,
        &mut browser,
        request,
        InteractionResult::login("alice"),
    )
    .await;

    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "consent_required");
    assert_eq!(delivered["error_description"], "prompt consent was not resolved");
    assert_eq!(delivered["state"], "af0ifjsldkj");
}

#[tokio::test]
async fn error_result_aborts_with_its_description() {
    let provider = provider();

    let mut browser = Browser::default();
    let response = authorize_through(
        &provider,
        &mut browser,
        params("code", "openid"),
        InteractionResult::error("access_denied", None),
    )
    .await;
    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "access_denied");
    assert_eq!(delivered["error_description"], "");

    let mut browser = Browser::default();
    let mut request = params("code", "openid");
    request.state = None;
    let response = authorize_through(
        &provider,
        &mut browser,
        request,
        InteractionResult::error("access_denied", Some("user said no".to_string())),
    )
    .await;
    let delivered = redirect_params(&response);
    assert_eq!(delivered["error_description"], "user said no");
    assert!(!delivered.contains_key("state"));
}

#[tokio::test]
async fn expired_transaction_cannot_resume() {
    let mut config = common::config();
    config.ttl.interaction = Duration::from_secs(1);
    let provider = provider_with(config);
    let mut browser = Browser::default();

    let response = provider
        .authorize(params("code", "openid"), &browser.cookies())
        .await;
    browser.absorb(&response);
    let uid = response
        .location()
        .and_then(|l| l.strip_prefix("/auth/"))
        .expect("interaction url")
        .to_string();

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let err = provider
        .interaction_finished(&uid, InteractionResult::login("alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RequestExpired));

    let response = provider.resume(&browser.cookies()).await;
    let (status, error, description) = local_error(&response);
    assert_eq!(status, 400);
    assert_eq!(error, "invalid_request");
    assert_eq!(description, "authorization request has expired");
}

#[tokio::test]
async fn resume_without_cookie_or_twice_is_expired() {
    let provider = provider();

    let response = provider.resume(&Browser::default().cookies()).await;
    let (_, _, description) = local_error(&response);
    assert_eq!(description, "authorization request has expired");

    let mut browser = Browser::default();
    let response = provider
        .authorize(params("code", "openid"), &browser.cookies())
        .await;
    browser.absorb(&response);
    let stale = browser.cookies();
    let uid = response
        .location()
        .and_then(|l| l.strip_prefix("/auth/"))
        .expect("interaction url")
        .to_string();
    provider
        .interaction_finished(&uid, InteractionResult::login("alice"))
        .await
        .expect("finish");

    let first = provider.resume(&stale).await;
    assert!(redirect_params(&first).contains_key("code"));
    let replay = provider.resume(&stale).await;
    let (status, _, description) = local_error(&replay);
    assert_eq!(status, 400);
    assert_eq!(description, "authorization request has expired");
}

#[tokio::test]
async fn missing_parameters_render_locally() {
    let provider = provider();
    let request = AuthorizationParams {
        client_id: Some(CLIENT_ID.to_string()),
        ..Default::default()
    };

    let response = provider.authorize(request, &Browser::default().cookies()).await;
    let (status, error, description) = local_error(&response);
    assert_eq!(status, 400);
    assert_eq!(error, "invalid_request");
    assert_eq!(description, "missing required parameter(s) response_type,scope");
}

#[tokio::test]
async fn missing_nonce_for_implicit_is_delivered_to_trusted_target() {
    let provider = provider();
    let mut request = params("id_token token", "openid");
    request.nonce = None;

    let response = provider.authorize(request, &Browser::default().cookies()).await;
    let location = response.location().expect("redirect").to_string();
    assert!(location.contains('#'), "fragment delivery expected: {location}");
    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "invalid_request");
    assert_eq!(delivered["error_description"], "missing required parameter(s) nonce");
    assert_eq!(delivered["state"], "af0ifjsldkj");
}

#[tokio::test]
async fn unknown_client_renders_locally() {
    let provider = provider();
    let mut request = params("code", "openid");
    request.client_id = Some("nobody".to_string());

    let response = provider.authorize(request, &Browser::default().cookies()).await;
    let (status, error, _) = local_error(&response);
    assert_eq!(status, 400);
    assert_eq!(error, "invalid_client");
}

#[tokio::test]
async fn redirect_uri_mismatch_renders_locally() {
    let provider = provider();
    let mut request = params("code", "openid");
    request.redirect_uri = Some("https://attacker.example.com/cb".to_string());

    let response = provider.authorize(request, &Browser::default().cookies()).await;
    let (status, error, _) = local_error(&response);
    assert_eq!(status, 400);
    assert_eq!(error, "redirect_uri_mismatch");
}

#[tokio::test]
async fn missing_openid_is_delivered_to_client() {
    let provider = provider();
    let response = provider
        .authorize(params("code", "profile"), &Browser::default().cookies())
        .await;

    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "invalid_request");
    assert_eq!(delivered["error_description"], "openid is required scope");
}

#[tokio::test]
async fn form_post_mode_renders_auto_submit_page() {
    let provider = provider();
    let mut browser = Browser::default();
    let mut request = params("code", "openid");
    request.response_mode = Some("form_post".to_string());

    let response = authorize_through(
        &provider,
        &mut browser,
        request,
        InteractionResult::login("alice"),
    )
    .await;

    match response.body {
        tessera_auth::ResponseBody::FormPost { action, params } => {
            assert_eq!(action, REDIRECT_URI);
            assert!(params.iter().any(|(name, _)| name == "code"));
            assert!(params.iter().any(|(name, value)| name == "state" && value == "af0ifjsldkj"));
        }
        other => panic!("expected form_post, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_session_account_gets_no_artifacts() {
    let provider = provider();
    let mut browser = Browser::default();

    let response = authorize_through(
        &provider,
        &mut browser,
        params("code", "openid"),
        InteractionResult::login("ghost"),
    )
    .await;

    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "login_required");
    assert_eq!(
        delivered["error_description"],
        "End-User authentication is required"
    );
    assert!(!delivered.contains_key("code"));
    assert!(!delivered.contains_key("session_state"));
}

#[tokio::test]
async fn resume_without_login_requires_authentication() {
    let provider = provider();
    let mut browser = Browser::default();

    let response = authorize_through(
        &provider,
        &mut browser,
        params("code", "openid"),
        InteractionResult::default(),
    )
    .await;

    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "login_required");
    assert_eq!(
        delivered["error_description"],
        "End-User authentication is required"
    );
    assert_eq!(delivered["state"], "af0ifjsldkj");
    assert!(!browser.has("_session"));
}

#[tokio::test]
async fn unresolved_custom_prompt_requires_interaction() {
    let provider = provider();
    let mut browser = Browser::default();
    let mut request = params("code", "openid");
    request.prompt = Some("mfa".to_string());

    let response = provider.authorize(request, &browser.cookies()).await;
    browser.absorb(&response);
    let uid = response
        .location()
        .and_then(|l| l.strip_prefix("/auth/"))
        .expect("interaction url")
        .to_string();
    let details = provider.interaction_details(&uid).await.expect("details");
    assert_eq!(details.prompts, vec!["login", "mfa"]);

    provider
        .interaction_finished(&uid, InteractionResult::login("alice"))
        .await
        .expect("finish");
    let response = provider.resume(&browser.cookies()).await;

    let delivered = redirect_params(&response);
    assert_eq!(delivered["error"], "interaction_required");
    assert_eq!(delivered["error_description"], "prompt mfa was not resolved");
    assert!(!delivered.contains_key("code"));
}
