use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, http::StatusCode, routing::get};
use tessera_auth::token::SigningAlgorithm;
use tessera_auth::{KeyStore, MemoryAccountProvider, MemoryClientRegistry, Provider};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;

/// Assembles the provider from configuration, generating signing keys for
/// every algorithm the provider or a client asks for.
pub fn build_provider(cfg: &AppConfig) -> anyhow::Result<Arc<Provider>> {
    let default_alg = SigningAlgorithm::parse(&cfg.provider.signing.algorithm)
        .with_context(|| format!("unsupported signing algorithm {}", cfg.provider.signing.algorithm))?;

    let mut algorithms = vec![default_alg];
    for client in &cfg.clients {
        if let Some(alg) = client
            .id_token_signed_response_alg
            .as_deref()
            .and_then(SigningAlgorithm::parse)
            && !algorithms.contains(&alg)
        {
            algorithms.push(alg);
        }
    }
    let keys = KeyStore::generate(&algorithms, default_alg).context("key generation failed")?;

    let clients = MemoryClientRegistry::new(cfg.clients.clone()).context("invalid client")?;
    let accounts = MemoryAccountProvider::new(cfg.accounts.clone());

    let provider = Provider::builder(cfg.provider.clone())
        .clients(Arc::new(clients))
        .accounts(Arc::new(accounts))
        .keys(Arc::new(keys))
        .build()?;

    tracing::info!(
        issuer = %cfg.provider.issuer,
        clients = cfg.clients.len(),
        accounts = cfg.accounts.len(),
        algorithms = ?algorithms.iter().map(SigningAlgorithm::as_str).collect::<Vec<_>>(),
        "provider initialized"
    );
    Ok(Arc::new(provider))
}

pub fn build_app(cfg: &AppConfig, provider: Arc<Provider>) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    tessera_auth::http::router(provider)
        .route("/healthz", get(healthz))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

pub struct TesseraServer {
    addr: SocketAddr,
    app: Router,
}

impl TesseraServer {
    pub fn new(cfg: &AppConfig) -> anyhow::Result<Self> {
        let provider = build_provider(cfg)?;
        Ok(Self {
            addr: cfg.addr(),
            app: build_app(cfg, provider),
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
