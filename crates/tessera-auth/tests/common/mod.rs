//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use tessera_auth::cookies::RequestCookies;
use tessera_auth::interaction::InteractionResult;
use tessera_auth::oauth::PresentedCredentials;
use tessera_auth::storage::Adapters;
use tessera_auth::token::{IdTokenClaims, SigningAlgorithm};
use tessera_auth::{
    Account, AuthorizationParams, Client, EndpointResponse, GrantType, KeyStore,
    MemoryAccountProvider, MemoryClientRegistry, Provider, ProviderConfig, ResponseBody,
};
use url::Url;

pub const CLIENT_ID: &str = "client";
pub const CLIENT_SECRET: &str = "secret";
pub const REDIRECT_URI: &str = "https://rp.example.com/cb";
pub const ISSUER: &str = "https://op.example.com";
pub const OTHER_CLIENT_ID: &str = "other";
pub const OTHER_CLIENT_SECRET: &str = "other-secret";

pub fn config() -> ProviderConfig {
    let mut config = ProviderConfig::default();
    config.issuer = ISSUER.to_string();
    config.signing.algorithm = "ES384".to_string();
    config
}

pub fn client() -> Client {
    let mut client = Client::new(CLIENT_ID);
    client.client_secret = Some(CLIENT_SECRET.to_string());
    client.redirect_uris = vec![REDIRECT_URI.to_string()];
    client.response_types = vec![
        "code".to_string(),
        "id_token token".to_string(),
        "code id_token".to_string(),
        "none".to_string(),
    ];
    client.grant_types = vec![
        GrantType::AuthorizationCode,
        GrantType::RefreshToken,
        GrantType::ClientCredentials,
    ];
    client.scopes = vec!["api:read".to_string(), "api:write".to_string()];
    client
}

/// A second confidential client sharing the redirect URI.
pub fn other_client() -> Client {
    let mut client = Client::new(OTHER_CLIENT_ID);
    client.client_secret = Some(OTHER_CLIENT_SECRET.to_string());
    client.redirect_uris = vec![REDIRECT_URI.to_string()];
    client.grant_types = vec![GrantType::AuthorizationCode, GrantType::RefreshToken];
    client
}

pub fn provider() -> Arc<Provider> {
    provider_with(config())
}

pub fn provider_with(config: ProviderConfig) -> Arc<Provider> {
    provider_with_adapters(config, Adapters::in_memory())
}

pub fn provider_with_adapters(config: ProviderConfig, adapters: Adapters) -> Arc<Provider> {
    let keys = KeyStore::generate(&[SigningAlgorithm::ES384], SigningAlgorithm::ES384)
        .expect("generate keys");
    let accounts = MemoryAccountProvider::new([Account::new("alice")
        .with_claim("email", "alice@example.com")
        .with_claim("name", "Alice")]);
    let provider = Provider::builder(config)
        .clients(Arc::new(
            MemoryClientRegistry::new([client(), other_client()]).expect("valid clients"),
        ))
        .accounts(Arc::new(accounts))
        .adapters(adapters)
        .keys(Arc::new(keys))
        .build()
        .expect("build provider");
    Arc::new(provider)
}

/// Authorization request for the test client.
pub fn params(response_type: &str, scope: &str) -> AuthorizationParams {
    AuthorizationParams {
        response_type: Some(response_type.to_string()),
        client_id: Some(CLIENT_ID.to_string()),
        redirect_uri: Some(REDIRECT_URI.to_string()),
        scope: Some(scope.to_string()),
        state: Some("af0ifjsldkj".to_string()),
        nonce: Some("n-0S6_WzA2Mj".to_string()),
        ..Default::default()
    }
}

pub fn basic_credentials() -> PresentedCredentials {
    PresentedCredentials::Basic {
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
    }
}

pub fn other_credentials() -> PresentedCredentials {
    PresentedCredentials::Basic {
        client_id: OTHER_CLIENT_ID.to_string(),
        client_secret: OTHER_CLIENT_SECRET.to_string(),
    }
}

/// A user agent keeping the cookies the provider sets.
#[derive(Debug, Default)]
pub struct Browser {
    jar: HashMap<String, String>,
}

impl Browser {
    pub fn absorb(&mut self, response: &EndpointResponse) {
        for cookie in &response.cookies {
            if cookie.value().is_empty() {
                self.jar.remove(cookie.name());
            } else {
                self.jar
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
    }

    pub fn cookies(&self) -> RequestCookies {
        self.jar.clone().into_iter().collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.jar.contains_key(name)
    }
}

/// Authorizes, finishes the interaction with `result` when one is required,
/// and resumes. Returns the final response.
pub async fn authorize_through(
    provider: &Provider,
    browser: &mut Browser,
    params: AuthorizationParams,
    result: InteractionResult,
) -> EndpointResponse {
    let response = provider.authorize(params, &browser.cookies()).await;
    browser.absorb(&response);

    let Some(location) = response.location() else {
        return response;
    };
    let Some(uid) = location.strip_prefix("/auth/") else {
        return response;
    };

    let resume_path = provider
        .interaction_finished(uid, result)
        .await
        .expect("finish interaction");
    assert_eq!(resume_path, "/auth/resume");

    let response = provider.resume(&browser.cookies()).await;
    browser.absorb(&response);
    response
}

/// Parameters delivered to the redirect URI, from the query or the fragment.
pub fn redirect_params(response: &EndpointResponse) -> HashMap<String, String> {
    let location = match &response.body {
        ResponseBody::Redirect { location } => location.clone(),
        other => panic!("expected a redirect, got {other:?}"),
    };
    assert!(
        location.starts_with(REDIRECT_URI),
        "unexpected redirect target {location}"
    );
    let url = Url::parse(&location).expect("absolute redirect");
    let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(fragment) = url.fragment() {
        params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }
    params
}

pub fn local_error(response: &EndpointResponse) -> (u16, String, String) {
    match &response.body {
        ResponseBody::LocalError {
            status,
            error,
            description,
        } => (*status, error.clone(), description.clone()),
        other => panic!("expected a local error, got {other:?}"),
    }
}

pub fn id_token_claims(provider: &Provider, id_token: &str) -> IdTokenClaims {
    provider
        .keys()
        .key_for(Some("ES384"))
        .expect("signing key")
        .decode::<IdTokenClaims>(id_token, ISSUER)
        .expect("valid id token")
        .claims
}
