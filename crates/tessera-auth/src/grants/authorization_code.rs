//! `authorization_code` grant.

use async_trait::async_trait;

use super::{GrantContext, GrantHandler, TokenResponse};
use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::{PkceChallenge, PkceVerifier};
use crate::storage::AudienceTarget;
use crate::token::{
    AccessToken, AuthContext, AuthorizationCode, Consumable, FindOptions, IdToken, RefreshToken,
    TokenStore,
};
use crate::types::{GrantType, Scope};

/// Exchanges an authorization code for tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationCodeGrant;

#[async_trait]
impl GrantHandler for AuthorizationCodeGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["code", "redirect_uri"]
    }

    async fn execute(&self, ctx: GrantContext<'_>) -> AuthResult<TokenResponse> {
        let GrantContext {
            provider,
            client,
            request,
        } = ctx;
        let config = provider.config();
        let codes = TokenStore::<AuthorizationCode>::new(provider.adapters());

        let value = request.param("code").unwrap_or_default();
        let code = codes
            .find(
                value,
                FindOptions {
                    ignore_expiration: true,
                },
            )
            .await?
            .ok_or_else(|| AuthError::invalid_grant("authorization code not found"))?;

        if code.base.is_expired() {
            return Err(AuthError::invalid_grant("authorization code is expired"));
        }
        if code.is_consumed() {
            return Err(AuthError::invalid_grant("authorization code already consumed"));
        }
        if code.base.client_id != client.client_id {
            return Err(AuthError::invalid_grant("authorization code client mismatch"));
        }
        if request.param("redirect_uri") != Some(code.redirect_uri.as_str()) {
            return Err(AuthError::invalid_grant(
                "authorization code redirect_uri mismatch",
            ));
        }

        if let Some(challenge) = code.code_challenge.as_deref() {
            let verifier = request
                .param("code_verifier")
                .ok_or_else(|| AuthError::missing_parameters(&["code_verifier"]))?;
            PkceChallenge::new(challenge)?.verify(&PkceVerifier::new(verifier)?)?;
        }

        if !codes.consume(&code).await? {
            return Err(AuthError::invalid_grant("authorization code already consumed"));
        }

        let account_id = code.auth.account_id.clone().unwrap_or_default();
        let account = provider
            .accounts()
            .find_account(&account_id)
            .await?
            .ok_or_else(|| {
                AuthError::invalid_grant("authorization code invalid (referenced account not found)")
            })?;

        let scope = code.auth.scope().to_string();
        let granted = Scope::parse(&scope);

        let aud = provider
            .audiences_for(client, AudienceTarget::AccessToken, &scope, Some(&account_id))
            .await?;
        let mut access_token = AccessToken::new(
            &client.client_id,
            config.ttl.access_token,
            AuthContext {
                aud: (!aud.is_empty()).then_some(aud),
                ..code.auth.clone()
            },
        );
        let access_value = TokenStore::<AccessToken>::new(provider.adapters())
            .save(&mut access_token)
            .await?;
        let mut response = TokenResponse::new(
            access_value.clone(),
            access_token.base.expires_in(),
            scope.clone(),
        );

        if granted.contains("offline_access") && client.is_grant_type_allowed(GrantType::RefreshToken)
        {
            let mut refresh_token =
                RefreshToken::new(&client.client_id, config.ttl.refresh_token, code.auth.clone());
            let refresh_value = TokenStore::<RefreshToken>::new(provider.adapters())
                .save(&mut refresh_token)
                .await?;
            response = response.with_refresh_token(refresh_value);
        }

        if granted.contains("openid") {
            let audiences = provider
                .audiences_for(client, AudienceTarget::IdToken, &scope, Some(&account_id))
                .await?;
            let id_token = IdToken::for_token(account, &code)
                .with_access_token(access_value)
                .sign(client, &audiences, &provider.id_token_signing())?;
            response = response.with_id_token(id_token);
        }

        Ok(response)
    }
}
