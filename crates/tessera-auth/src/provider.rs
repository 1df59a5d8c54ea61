//! The provider: configuration plus collaborators, and the public entry
//! points of the engine.
//!
//! A [`Provider`] is built once at startup and shared behind an `Arc`; it
//! holds no mutable state of its own.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::authorization::{self, AuthorizationParams, EndpointResponse};
use crate::config::ProviderConfig;
use crate::cookies::{RequestCookies, SignedCookies};
use crate::error::AuthError;
use crate::grants::{GrantDispatcher, TokenRequest, TokenResponse};
use crate::interaction::{
    self, InteractionDetails, InteractionResult, SessionStore, TransactionStore,
};
use crate::oauth::{PresentedCredentials, authenticate_client};
use crate::storage::{
    AccountProvider, Adapters, AudienceRequest, AudienceResolver, AudienceTarget, ClientRegistry,
    NoAudiences,
};
use crate::token::{IdTokenSigning, KeyStore};
use crate::types::Client;

/// OAuth 2.0 / OpenID Connect provider.
pub struct Provider {
    config: Arc<ProviderConfig>,
    clients: Arc<dyn ClientRegistry>,
    accounts: Arc<dyn AccountProvider>,
    audiences: Arc<dyn AudienceResolver>,
    adapters: Adapters,
    keys: Arc<KeyStore>,
    cookies: SignedCookies,
    grants: GrantDispatcher,
}

impl Provider {
    #[must_use]
    pub fn builder(config: ProviderConfig) -> ProviderBuilder {
        ProviderBuilder::new(config)
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[must_use]
    pub fn adapters(&self) -> &Adapters {
        &self.adapters
    }

    #[must_use]
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    #[must_use]
    pub fn cookies(&self) -> &SignedCookies {
        &self.cookies
    }

    pub(crate) fn clients(&self) -> &dyn ClientRegistry {
        self.clients.as_ref()
    }

    pub(crate) fn accounts(&self) -> &dyn AccountProvider {
        self.accounts.as_ref()
    }

    pub(crate) fn sessions(&self) -> SessionStore {
        SessionStore::new(&self.adapters, self.config.ttl.session)
    }

    pub(crate) fn transactions(&self) -> TransactionStore {
        TransactionStore::new(&self.adapters)
    }

    pub(crate) fn id_token_signing(&self) -> IdTokenSigning<'_> {
        IdTokenSigning {
            keys: &self.keys,
            issuer: &self.config.issuer,
            ttl: self.config.ttl.id_token,
            pairwise_salt: &self.config.pairwise_salt,
        }
    }

    /// Audiences for a token about to be issued.
    pub(crate) async fn audiences_for(
        &self,
        client: &Client,
        target: AudienceTarget,
        scope: &str,
        account_id: Option<&str>,
    ) -> AuthResult<Vec<String>> {
        self.audiences
            .audiences(AudienceRequest {
                client,
                target,
                scope,
                account_id,
            })
            .await
    }

    pub(crate) fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    /// Handles an authorization request (`GET`/`POST /auth`).
    pub async fn authorize(
        &self,
        params: AuthorizationParams,
        cookies: &RequestCookies,
    ) -> EndpointResponse {
        authorization::authorize(self, params.normalized(), cookies).await
    }

    /// Resumes a suspended request from the interaction cookie
    /// (`GET /auth/resume`).
    pub async fn resume(&self, cookies: &RequestCookies) -> EndpointResponse {
        interaction::resume(self, cookies).await
    }

    /// Describes a pending interaction to the interaction UI.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RequestExpired` if the transaction is unknown or
    /// expired.
    pub async fn interaction_details(&self, uid: &str) -> AuthResult<InteractionDetails> {
        interaction::details(self, uid).await
    }

    /// Attaches `result` to a pending interaction and returns the URL the
    /// end-user agent must visit to resume.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RequestExpired` if the transaction is unknown or
    /// expired.
    pub async fn interaction_finished(
        &self,
        uid: &str,
        result: InteractionResult,
    ) -> AuthResult<String> {
        interaction::finished(self, uid, result).await
    }

    /// Handles a token request (`POST /token`).
    ///
    /// # Errors
    ///
    /// Returns the OAuth error to render as the JSON error body.
    pub async fn token(
        &self,
        request: TokenRequest,
        credentials: PresentedCredentials,
    ) -> AuthResult<TokenResponse> {
        let Some(grant_type) = request.grant_type.as_deref() else {
            return Err(AuthError::missing_parameters(&["grant_type"]));
        };
        let client = authenticate_client(&credentials, self.clients()).await?;

        tracing::debug!(client_id = %client.client_id, grant_type, "dispatching token request");
        self.grants.dispatch(self, &client, &request).await
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("issuer", &self.config.issuer)
            .field("grants", &self.grants)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Provider`].
pub struct ProviderBuilder {
    config: ProviderConfig,
    clients: Option<Arc<dyn ClientRegistry>>,
    accounts: Option<Arc<dyn AccountProvider>>,
    audiences: Option<Arc<dyn AudienceResolver>>,
    adapters: Option<Adapters>,
    keys: Option<Arc<KeyStore>>,
    grants: Option<GrantDispatcher>,
}

impl ProviderBuilder {
    fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            clients: None,
            accounts: None,
            audiences: None,
            adapters: None,
            keys: None,
            grants: None,
        }
    }

    #[must_use]
    pub fn clients(mut self, clients: Arc<dyn ClientRegistry>) -> Self {
        self.clients = Some(clients);
        self
    }

    #[must_use]
    pub fn accounts(mut self, accounts: Arc<dyn AccountProvider>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    #[must_use]
    pub fn audiences(mut self, audiences: Arc<dyn AudienceResolver>) -> Self {
        self.audiences = Some(audiences);
        self
    }

    /// Storage adapters; in-memory when not set.
    #[must_use]
    pub fn adapters(mut self, adapters: Adapters) -> Self {
        self.adapters = Some(adapters);
        self
    }

    #[must_use]
    pub fn keys(mut self, keys: Arc<KeyStore>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Grant handlers; the three built-in grants when not set.
    #[must_use]
    pub fn grants(mut self, grants: GrantDispatcher) -> Self {
        self.grants = Some(grants);
        self
    }

    /// Validates the configuration and assembles the provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the configuration is invalid,
    /// a required collaborator is missing, or the key store has no key for
    /// the configured signing algorithm.
    pub fn build(self) -> AuthResult<Provider> {
        self.config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let clients = self
            .clients
            .ok_or_else(|| AuthError::configuration("a client registry is required"))?;
        let accounts = self
            .accounts
            .ok_or_else(|| AuthError::configuration("an account provider is required"))?;
        let keys = self
            .keys
            .ok_or_else(|| AuthError::configuration("a signing key store is required"))?;
        keys.key_for(Some(self.config.signing.algorithm.as_str()))?;

        let cookies = SignedCookies::from_config(&self.config.cookies)
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        Ok(Provider {
            config: Arc::new(self.config),
            clients,
            accounts,
            audiences: self.audiences.unwrap_or_else(|| Arc::new(NoAudiences)),
            adapters: self.adapters.unwrap_or_else(Adapters::in_memory),
            keys,
            cookies,
            grants: self.grants.unwrap_or_default(),
        })
    }
}
