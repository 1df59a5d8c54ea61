//! Mutable state threaded through the validation chain.

use super::params::AuthorizationParams;
use crate::AuthResult;
use crate::error::AuthError;
use crate::types::{Client, ResponseMode, ResponseType};

/// Where an error may be delivered by redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub redirect_uri: String,
    pub mode: ResponseMode,
    pub state: Option<String>,
}

/// An authorization request being validated.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    pub params: AuthorizationParams,

    /// Set by the client check.
    pub client: Option<Client>,

    /// Set by the redirect URI check before it compares the whitelist. Any
    /// error other than a mismatch raised once this is set comes after a
    /// passing check, so its target is trusted as is.
    pub redirect_uri_checked: bool,
}

impl AuthorizationContext {
    #[must_use]
    pub fn new(params: AuthorizationParams) -> Self {
        Self {
            params,
            client: None,
            redirect_uri_checked: false,
        }
    }

    /// The resolved client.
    ///
    /// # Errors
    ///
    /// Returns an internal error if called before the client check.
    pub fn client(&self) -> AuthResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| AuthError::internal("client not resolved"))
    }

    #[must_use]
    pub fn response_type(&self) -> Option<ResponseType> {
        self.params.response_type.as_deref().and_then(ResponseType::parse)
    }

    /// The requested response mode when valid for the response type,
    /// otherwise the response type's default.
    #[must_use]
    pub fn response_mode(&self) -> ResponseMode {
        let response_type = self.response_type();
        let requested = self.params.response_mode.as_deref().and_then(ResponseMode::parse);
        match (requested, response_type) {
            (Some(mode), Some(rt)) if mode.is_allowed_for(&rt) => mode,
            (Some(mode), None) => mode,
            (_, Some(rt)) => rt.default_mode(),
            (None, None) => ResponseMode::Query,
        }
    }

    /// Decides whether `error` can be delivered to the client.
    ///
    /// Redirect URI mismatches and client errors are always rendered
    /// locally. Otherwise the target is trusted once the redirect URI check
    /// passed, or when the resolved client whitelists the supplied URI.
    #[must_use]
    pub fn redirect_target(&self, error: &AuthError) -> Option<RedirectTarget> {
        if matches!(
            error,
            AuthError::RedirectUriMismatch | AuthError::InvalidClient { .. }
        ) {
            return None;
        }
        let client = self.client.as_ref()?;
        let redirect_uri = self.params.redirect_uri.as_deref()?;
        if !self.redirect_uri_checked && !client.is_redirect_uri_allowed(redirect_uri) {
            return None;
        }
        Some(RedirectTarget {
            redirect_uri: redirect_uri.to_string(),
            mode: self.response_mode(),
            state: self.params.state.clone(),
        })
    }
}
