//! Account provider and audience resolver hooks.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::{Account, Client};

/// Resolves end-user accounts referenced by sessions and tokens.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Finds an account by id.
    ///
    /// # Returns
    ///
    /// Returns `Some(account)` if it exists, `None` if it was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the account store cannot be queried.
    async fn find_account(&self, account_id: &str) -> AuthResult<Option<Account>>;
}

/// Token an audience is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceTarget {
    AccessToken,
    ClientCredentials,
    IdToken,
}

/// Input to [`AudienceResolver::audiences`].
#[derive(Debug, Clone, Copy)]
pub struct AudienceRequest<'a> {
    pub client: &'a Client,
    pub target: AudienceTarget,
    pub scope: &'a str,
    pub account_id: Option<&'a str>,
}

/// Decides the audiences of issued access and ID tokens.
#[async_trait]
pub trait AudienceResolver: Send + Sync {
    /// Returns extra audiences for the token being issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the audiences cannot be determined.
    async fn audiences(&self, request: AudienceRequest<'_>) -> AuthResult<Vec<String>>;
}

/// Resolver that adds no audiences.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudiences;

#[async_trait]
impl AudienceResolver for NoAudiences {
    async fn audiences(&self, _request: AudienceRequest<'_>) -> AuthResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Resolver returning a fixed list for every token.
#[derive(Debug, Clone, Default)]
pub struct StaticAudiences(pub Vec<String>);

#[async_trait]
impl AudienceResolver for StaticAudiences {
    async fn audiences(&self, _request: AudienceRequest<'_>) -> AuthResult<Vec<String>> {
        Ok(self.0.clone())
    }
}
