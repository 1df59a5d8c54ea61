//! Grant Dispatcher.
//!
//! Token requests are routed to a [`GrantHandler`] registered for the
//! request's `grant_type`. The dispatcher checks that the grant type is known
//! and allowed for the client, and that the handler's mandatory parameters
//! are present, before the handler runs.

pub mod authorization_code;
pub mod client_credentials;
pub mod refresh_token;
pub mod token;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::error::AuthError;
use crate::provider::Provider;
use crate::types::{Client, GrantType};

pub use authorization_code::AuthorizationCodeGrant;
pub use client_credentials::ClientCredentialsGrant;
pub use refresh_token::RefreshTokenGrant;
pub use token::{TokenErrorBody, TokenRequest, TokenResponse};

/// Inputs available to a grant handler.
#[derive(Clone, Copy)]
pub struct GrantContext<'a> {
    pub provider: &'a Provider,
    /// The authenticated client.
    pub client: &'a Client,
    pub request: &'a TokenRequest,
}

/// Exchanges one kind of grant for tokens.
#[async_trait]
pub trait GrantHandler: Send + Sync {
    fn grant_type(&self) -> GrantType;

    /// Parameters that must be present, in reporting order.
    fn required_parameters(&self) -> &'static [&'static str];

    /// Executes the grant.
    ///
    /// # Errors
    ///
    /// Returns the OAuth error to deliver to the client.
    async fn execute(&self, ctx: GrantContext<'_>) -> AuthResult<TokenResponse>;
}

/// Grant handlers by grant type.
#[derive(Clone)]
pub struct GrantDispatcher {
    handlers: HashMap<GrantType, Arc<dyn GrantHandler>>,
}

impl GrantDispatcher {
    /// A dispatcher with no handlers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler`, replacing any handler for the same grant type.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn GrantHandler>) -> Self {
        self.handlers.insert(handler.grant_type(), handler);
        self
    }

    /// Routes `request` to its handler.
    ///
    /// # Errors
    ///
    /// - `unsupported_grant_type` if no handler is registered
    /// - `unauthorized_client` if the client may not use the grant
    /// - `invalid_request` if mandatory parameters are missing
    /// - whatever the handler reports
    pub async fn dispatch(
        &self,
        provider: &Provider,
        client: &Client,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse> {
        let raw = request.param("grant_type").unwrap_or_default();
        let handler = GrantType::parse(raw)
            .and_then(|grant_type| self.handlers.get(&grant_type))
            .ok_or_else(|| AuthError::unsupported_grant_type(raw))?;

        if !client.is_grant_type_allowed(handler.grant_type()) {
            return Err(AuthError::unauthorized_client(
                "requested grant type is restricted to this client",
            ));
        }

        let missing: Vec<&str> = handler
            .required_parameters()
            .iter()
            .copied()
            .filter(|name| request.param(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AuthError::missing_parameters(&missing));
        }

        let result = handler
            .execute(GrantContext {
                provider,
                client,
                request,
            })
            .await;

        match &result {
            Ok(_) => tracing::info!(
                client_id = %client.client_id,
                grant_type = raw,
                "token issued"
            ),
            Err(err) if err.is_server_error() => tracing::error!(
                client_id = %client.client_id,
                grant_type = raw,
                error = %err,
                "token request failed"
            ),
            Err(err) => tracing::warn!(
                client_id = %client.client_id,
                grant_type = raw,
                error = err.oauth_error_code(),
                "token request rejected"
            ),
        }
        result
    }
}

impl Default for GrantDispatcher {
    /// The authorization code, refresh token and client credentials grants.
    fn default() -> Self {
        Self::empty()
            .with_handler(Arc::new(AuthorizationCodeGrant))
            .with_handler(Arc::new(RefreshTokenGrant))
            .with_handler(Arc::new(ClientCredentialsGrant))
    }
}

impl fmt::Debug for GrantDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grants: Vec<&str> = self.handlers.keys().map(GrantType::as_str).collect();
        grants.sort_unstable();
        f.debug_struct("GrantDispatcher")
            .field("grants", &grants)
            .finish()
    }
}
