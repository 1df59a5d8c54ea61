//! `refresh_token` grant.
//!
//! Under [`RefreshTokenRotation::RotateAndConsume`] the presented token is
//! consumed atomically and a replacement carrying the same grant is issued;
//! of two concurrent exchanges of one token exactly one succeeds.

use async_trait::async_trait;

use super::{GrantContext, GrantHandler, TokenResponse};
use crate::AuthResult;
use crate::config::RefreshTokenRotation;
use crate::error::AuthError;
use crate::storage::AudienceTarget;
use crate::token::{
    AccessToken, AuthContext, Consumable, FindOptions, IdToken, RefreshToken, TokenStore,
};
use crate::types::{GrantType, Scope};

/// Exchanges a refresh token for a fresh access token.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshTokenGrant;

#[async_trait]
impl GrantHandler for RefreshTokenGrant {
    fn grant_type(&self) -> GrantType {
        GrantType::RefreshToken
    }

    fn required_parameters(&self) -> &'static [&'static str] {
        &["refresh_token"]
    }

    async fn execute(&self, ctx: GrantContext<'_>) -> AuthResult<TokenResponse> {
        let GrantContext {
            provider,
            client,
            request,
        } = ctx;
        let config = provider.config();
        let store = TokenStore::<RefreshToken>::new(provider.adapters());

        let mut refresh_value = request.param("refresh_token").unwrap_or_default().to_string();
        let refresh_token = store
            .find(
                &refresh_value,
                FindOptions {
                    ignore_expiration: true,
                },
            )
            .await?
            .ok_or_else(|| AuthError::invalid_grant("refresh token not found"))?;

        if refresh_token.base.is_expired() {
            return Err(AuthError::invalid_grant("refresh token is expired"));
        }
        if refresh_token.base.client_id != client.client_id {
            return Err(AuthError::invalid_grant("refresh token client mismatch"));
        }

        let stored_scope = Scope::parse(refresh_token.auth.scope());
        let scope = match request.param("scope") {
            Some(requested) => {
                let requested = Scope::parse(requested);
                if !requested.contains("openid") {
                    return Err(AuthError::invalid_scope("openid is required scope", "openid"));
                }
                let excess = requested.missing_from(&stored_scope);
                if !excess.is_empty() {
                    return Err(AuthError::invalid_scope(
                        "refresh token missing requested scope",
                        excess.join(" "),
                    ));
                }
                requested
            }
            None => stored_scope,
        };
        let scope = scope.to_string();

        let account_id = refresh_token.auth.account_id.clone().unwrap_or_default();
        let account = provider
            .accounts()
            .find_account(&account_id)
            .await?
            .ok_or_else(|| {
                AuthError::invalid_grant("refresh token invalid (referenced account not found)")
            })?;

        if config.refresh_token_rotation == RefreshTokenRotation::RotateAndConsume {
            if refresh_token.is_consumed() || !store.consume(&refresh_token).await? {
                return Err(AuthError::invalid_grant("refresh token already used"));
            }

            let mut replacement = RefreshToken::new(
                &client.client_id,
                config.ttl.refresh_token,
                AuthContext {
                    aud: None,
                    ..refresh_token.auth.clone()
                },
            );
            match store.save(&mut replacement).await {
                Ok(value) => refresh_value = value,
                Err(err) => {
                    if !replacement.base.jti.is_empty()
                        && let Err(destroy_err) = store.destroy(&replacement).await
                    {
                        tracing::error!(error = %destroy_err, "failed to destroy replacement refresh token");
                    }
                    return Err(err);
                }
            }
        }

        let auth = AuthContext {
            scope: Some(scope.clone()),
            ..refresh_token.auth.clone()
        };

        let aud = provider
            .audiences_for(client, AudienceTarget::AccessToken, &scope, Some(&account_id))
            .await?;
        let mut access_token = AccessToken::new(
            &client.client_id,
            config.ttl.access_token,
            AuthContext {
                aud: (!aud.is_empty()).then_some(aud),
                ..auth.clone()
            },
        );
        let access_value = TokenStore::<AccessToken>::new(provider.adapters())
            .save(&mut access_token)
            .await?;

        let mut response = TokenResponse::new(
            access_value.clone(),
            access_token.base.expires_in(),
            scope.clone(),
        )
        .with_refresh_token(refresh_value);

        if Scope::parse(&scope).contains("openid") {
            let audiences = provider
                .audiences_for(client, AudienceTarget::IdToken, &scope, Some(&account_id))
                .await?;
            let id_token = IdToken::new(account, auth)
                .with_access_token(access_value)
                .sign(client, &audiences, &provider.id_token_signing())?;
            response = response.with_id_token(id_token);
        }

        Ok(response)
    }
}
