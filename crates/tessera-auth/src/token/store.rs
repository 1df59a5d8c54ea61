//! Typed persistence of tokens over an [`Adapter`].

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use super::model::{Consumable, Token};
use super::{generate_token, hash_token};
use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{Adapter, Adapters};

/// Lookup options for [`TokenStore::find`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    /// Return expired tokens instead of treating them as absent.
    pub ignore_expiration: bool,
}

/// Saves and loads one token kind.
///
/// The external token value is never stored; records are keyed by its
/// SHA-256 hash.
pub struct TokenStore<T> {
    adapter: Arc<dyn Adapter>,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for TokenStore<T> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T: Token> TokenStore<T> {
    #[must_use]
    pub fn new(adapters: &Adapters) -> Self {
        Self {
            adapter: adapters.get(T::KIND).clone(),
            _kind: PhantomData,
        }
    }

    /// Validates and persists `token`, returning its external value.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing required fields or the
    /// adapter fails.
    pub async fn save(&self, token: &mut T) -> AuthResult<String> {
        token.validate()?;

        let value = generate_token();
        let id = hash_token(&value);
        token.base_mut().jti = id.clone();

        let ttl = Duration::from_secs(token.base().expires_in());
        let payload = serde_json::to_value(&*token)?;
        self.adapter.upsert(&id, payload, ttl).await?;

        tracing::debug!(kind = %T::KIND, "token saved");
        Ok(value)
    }

    /// Loads the token for an external value.
    ///
    /// Expired tokens are reported as absent unless
    /// `options.ignore_expiration` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails or the payload is corrupt.
    pub async fn find(&self, value: &str, options: FindOptions) -> AuthResult<Option<T>> {
        let id = hash_token(value);
        let Some(payload) = self.adapter.find(&id).await? else {
            return Ok(None);
        };

        let mut token: T = serde_json::from_value(payload).map_err(|e| {
            AuthError::storage(format!("corrupt {} payload: {e}", T::KIND))
        })?;
        token.base_mut().jti = id;

        if !options.ignore_expiration && token.is_expired() {
            return Ok(None);
        }
        Ok(Some(token))
    }

    /// Deletes the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails.
    pub async fn destroy(&self, token: &T) -> AuthResult<()> {
        self.adapter.destroy(&token.base().jti).await
    }
}

impl<T: Consumable> TokenStore<T> {
    /// Atomically marks the token consumed.
    ///
    /// Returns `Ok(false)` if another caller consumed it first.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter fails.
    pub async fn consume(&self, token: &T) -> AuthResult<bool> {
        self.adapter.consume(&token.base().jti).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::model::{AccessToken, AuthContext, RefreshToken};

    fn auth() -> AuthContext {
        AuthContext {
            account_id: Some("user-1".into()),
            scope: Some("openid offline_access".into()),
            grant_id: Some("grant-1".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let adapters = Adapters::in_memory();
        let store = TokenStore::<AccessToken>::new(&adapters);

        let mut token = AccessToken::new("client", Duration::from_secs(60), auth());
        let value = store.save(&mut token).await.unwrap();
        assert_eq!(value.len(), 43);
        assert_eq!(token.base.jti, hash_token(&value));

        let found = store
            .find(&value, FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.auth.account_id.as_deref(), Some("user-1"));
        assert_eq!(found.base.jti, token.base.jti);

        assert!(
            store
                .find("unknown", FindOptions::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_plaintext_never_used_as_key() {
        let adapters = Adapters::in_memory();
        let store = TokenStore::<AccessToken>::new(&adapters);
        let mut token = AccessToken::new("client", Duration::from_secs(60), auth());
        let value = store.save(&mut token).await.unwrap();

        let adapter = adapters.get(AccessToken::KIND);
        assert!(adapter.find(&value).await.unwrap().is_none());
        assert!(adapter.find(&hash_token(&value)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_hidden_unless_ignored() {
        let adapters = Adapters::in_memory();
        let store = TokenStore::<RefreshToken>::new(&adapters);
        let mut token = RefreshToken::new("client", Duration::ZERO, auth());
        let value = store.save(&mut token).await.unwrap();

        assert!(
            store
                .find(&value, FindOptions::default())
                .await
                .unwrap()
                .is_none()
        );
        let found = store
            .find(
                &value,
                FindOptions {
                    ignore_expiration: true,
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(found.is_expired());
    }

    #[tokio::test]
    async fn test_consume_and_destroy() {
        let adapters = Adapters::in_memory();
        let store = TokenStore::<RefreshToken>::new(&adapters);
        let mut token = RefreshToken::new("client", Duration::from_secs(60), auth());
        let value = store.save(&mut token).await.unwrap();

        assert!(store.consume(&token).await.unwrap());
        assert!(!store.consume(&token).await.unwrap());

        let found = store
            .find(&value, FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert!(found.is_consumed());

        store.destroy(&found).await.unwrap();
        assert!(
            store
                .find(&value, FindOptions::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_save_rejects_incomplete_token() {
        let adapters = Adapters::in_memory();
        let store = TokenStore::<AccessToken>::new(&adapters);
        let mut token = AccessToken::new("client", Duration::from_secs(60), AuthContext::default());
        assert!(store.save(&mut token).await.is_err());
    }
}
