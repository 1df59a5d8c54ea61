//! `client_credentials` grant.

use async_trait::async_trait;

use super::{GrantContext, GrantHandler, TokenResponse};
use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::AudienceTarget;
use crate::token::{ClientCredentials, TokenStore};
use crate::types::{GrantType, Scope};

/// Issues a token to the client acting on its own behalf.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientCredentialsGrant;

#[async_trait]
impl GrantHandler for ClientCredentialsGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &[]
    }

    async fn execute(&self, ctx: GrantContext<'_>) -> AuthResult<TokenResponse> {
        let GrantContext {
            provider,
            client,
            request,
        } = ctx;

        let requested = Scope::parse(request.param("scope").unwrap_or_default());
        let allowed: Scope = client.scopes.iter().map(String::as_str).collect();
        let excess = requested.missing_from(&allowed);
        if !excess.is_empty() {
            return Err(AuthError::invalid_scope(
                "requested scope is not allowed",
                excess.join(" "),
            ));
        }
        let scope = requested.to_string();

        let aud = provider
            .audiences_for(client, AudienceTarget::ClientCredentials, &scope, None)
            .await?;
        let mut token = ClientCredentials::new(
            &client.client_id,
            provider.config().ttl.client_credentials,
            scope.clone(),
        );
        token.aud = (!aud.is_empty()).then_some(aud);

        let value = TokenStore::<ClientCredentials>::new(provider.adapters())
            .save(&mut token)
            .await?;
        Ok(TokenResponse::new(value, token.base.expires_in(), scope))
    }
}
