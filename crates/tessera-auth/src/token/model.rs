//! Persisted token kinds.
//!
//! Every kind is composed of a [`BaseToken`] (identity, ownership and
//! lifetime) and, for tokens issued on behalf of an end-user, an
//! [`AuthContext`] (the authentication facts carried forward from the grant).
//! Both are flattened into one JSON payload.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::EntityKind;
use crate::types::ClaimsRequest;

/// Fields common to every persisted token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseToken {
    /// Storage id: SHA-256 hex digest of the token value. Set on save/find.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,

    pub kind: String,

    pub client_id: String,

    /// Issued at (unix seconds).
    pub iat: i64,

    /// Expires at (unix seconds).
    pub exp: i64,

    /// Consumption time (unix seconds), injected by the adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed: Option<i64>,
}

impl BaseToken {
    #[must_use]
    pub fn new(kind: EntityKind, client_id: impl Into<String>, ttl: Duration) -> Self {
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            jti: String::new(),
            kind: kind.as_str().to_string(),
            client_id: client_id.into(),
            iat,
            exp: iat.saturating_add(ttl),
            consumed: None,
        }
    }

    /// Expiration is computed at each call, never cached.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp <= OffsetDateTime::now_utc().unix_timestamp()
    }

    /// Seconds until expiry, zero once expired.
    #[must_use]
    pub fn expires_in(&self) -> u64 {
        let remaining = self.exp - OffsetDateTime::now_utc().unix_timestamp();
        u64::try_from(remaining).unwrap_or(0)
    }
}

/// Authentication facts carried by end-user tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<ClaimsRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

impl AuthContext {
    fn require(&self, kind: &str) -> AuthResult<()> {
        if self.account_id.is_none() {
            return Err(AuthError::internal(format!("{kind} requires an account_id")));
        }
        if self.scope.is_none() {
            return Err(AuthError::internal(format!("{kind} requires a scope")));
        }
        Ok(())
    }

    /// The granted scope, empty when unset.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or_default()
    }
}

/// A persisted token kind.
pub trait Token: Serialize + DeserializeOwned + Send + Sync {
    /// Adapter the kind is stored with.
    const KIND: EntityKind;

    fn base(&self) -> &BaseToken;

    fn base_mut(&mut self) -> &mut BaseToken;

    /// Checks the kind's required fields before it is saved.
    fn validate(&self) -> AuthResult<()> {
        Ok(())
    }

    fn is_expired(&self) -> bool {
        self.base().is_expired()
    }
}

/// Tokens issued on behalf of an end-user.
pub trait StoresAuth: Token {
    fn auth(&self) -> &AuthContext;
}

/// Tokens that may be used exactly once.
pub trait Consumable: Token {
    fn is_consumed(&self) -> bool {
        self.base().consumed.is_some()
    }
}

/// One-time code exchanged at the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    #[serde(flatten)]
    pub base: BaseToken,

    #[serde(flatten)]
    pub auth: AuthContext,

    pub redirect_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

impl AuthorizationCode {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        ttl: Duration,
        auth: AuthContext,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseToken::new(EntityKind::AuthorizationCode, client_id, ttl),
            auth,
            redirect_uri: redirect_uri.into(),
            code_challenge: None,
            code_challenge_method: None,
        }
    }
}

impl Token for AuthorizationCode {
    const KIND: EntityKind = EntityKind::AuthorizationCode;

    fn base(&self) -> &BaseToken {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseToken {
        &mut self.base
    }

    fn validate(&self) -> AuthResult<()> {
        self.auth.require("AuthorizationCode")?;
        if self.redirect_uri.is_empty() {
            return Err(AuthError::internal(
                "AuthorizationCode requires a redirect_uri",
            ));
        }
        Ok(())
    }
}

impl StoresAuth for AuthorizationCode {
    fn auth(&self) -> &AuthContext {
        &self.auth
    }
}

impl Consumable for AuthorizationCode {}

/// Bearer access token issued to an end-user session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(flatten)]
    pub base: BaseToken,

    #[serde(flatten)]
    pub auth: AuthContext,
}

impl AccessToken {
    #[must_use]
    pub fn new(client_id: impl Into<String>, ttl: Duration, auth: AuthContext) -> Self {
        Self {
            base: BaseToken::new(EntityKind::AccessToken, client_id, ttl),
            auth,
        }
    }
}

impl Token for AccessToken {
    const KIND: EntityKind = EntityKind::AccessToken;

    fn base(&self) -> &BaseToken {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseToken {
        &mut self.base
    }

    fn validate(&self) -> AuthResult<()> {
        self.auth.require("AccessToken")
    }
}

impl StoresAuth for AccessToken {
    fn auth(&self) -> &AuthContext {
        &self.auth
    }
}

/// Long-lived token exchanged for fresh access tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken {
    #[serde(flatten)]
    pub base: BaseToken,

    #[serde(flatten)]
    pub auth: AuthContext,
}

impl RefreshToken {
    #[must_use]
    pub fn new(client_id: impl Into<String>, ttl: Duration, auth: AuthContext) -> Self {
        Self {
            base: BaseToken::new(EntityKind::RefreshToken, client_id, ttl),
            auth,
        }
    }
}

impl Token for RefreshToken {
    const KIND: EntityKind = EntityKind::RefreshToken;

    fn base(&self) -> &BaseToken {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseToken {
        &mut self.base
    }

    fn validate(&self) -> AuthResult<()> {
        self.auth.require("RefreshToken")?;
        if self.auth.grant_id.is_none() {
            return Err(AuthError::internal("RefreshToken requires a grant_id"));
        }
        Ok(())
    }
}

impl StoresAuth for RefreshToken {
    fn auth(&self) -> &AuthContext {
        &self.auth
    }
}

impl Consumable for RefreshToken {}

/// Access token issued to a client acting on its own behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCredentials {
    #[serde(flatten)]
    pub base: BaseToken,

    pub scope: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Vec<String>>,
}

impl ClientCredentials {
    #[must_use]
    pub fn new(client_id: impl Into<String>, ttl: Duration, scope: impl Into<String>) -> Self {
        Self {
            base: BaseToken::new(EntityKind::ClientCredentials, client_id, ttl),
            scope: scope.into(),
            aud: None,
        }
    }
}

impl Token for ClientCredentials {
    const KIND: EntityKind = EntityKind::ClientCredentials;

    fn base(&self) -> &BaseToken {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseToken {
        &mut self.base
    }
}
