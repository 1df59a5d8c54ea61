use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tessera_auth::{Client, GrantType};
use tessera_server::{AppConfig, build_app, build_provider};
use tower::ServiceExt;

fn config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.provider.signing.algorithm = "ES384".into();
    let mut client = Client::new("rp");
    client.client_secret = Some("secret".into());
    client.redirect_uris = vec!["https://rp.example.com/cb".into()];
    client.grant_types = vec![GrantType::AuthorizationCode, GrantType::ClientCredentials];
    cfg.clients.push(client);
    cfg
}

#[tokio::test]
async fn healthz_and_authorize_are_routed() {
    let cfg = config();
    let provider = build_provider(&cfg).expect("provider");
    let app = build_app(&cfg, provider);

    let response = app
        .clone()
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get(
                "/auth?response_type=code&client_id=rp&scope=openid\
                 &redirect_uri=https%3A%2F%2Frp.example.com%2Fcb",
            )
            .body(Body::empty())
            .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().expect("location");
    assert!(location.starts_with("/auth/"));
}

#[test]
fn unknown_signing_algorithm_fails_provider_build() {
    let mut cfg = config();
    cfg.provider.signing.algorithm = "HS256".into();
    assert!(build_provider(&cfg).is_err());
}
