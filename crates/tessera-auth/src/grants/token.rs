//! Token endpoint request and response shapes.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Token request parameters.
///
/// Which fields are required depends on `grant_type`:
///
/// - `authorization_code`: code, redirect_uri, code_verifier (with PKCE)
/// - `refresh_token`: refresh_token, optional scope
/// - `client_credentials`: optional scope
///
/// `client_id` / `client_secret` are only read for `client_secret_post` and
/// public clients; HTTP Basic credentials come from the header.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub grant_type: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub redirect_uri: Option<String>,

    #[serde(default)]
    pub code_verifier: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,
}

impl TokenRequest {
    /// Looks a parameter up by its wire name; empty values count as absent.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        let value = match name {
            "grant_type" => &self.grant_type,
            "code" => &self.code,
            "redirect_uri" => &self.redirect_uri,
            "code_verifier" => &self.code_verifier,
            "refresh_token" => &self.refresh_token,
            "scope" => &self.scope,
            "client_id" => &self.client_id,
            "client_secret" => &self.client_secret,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }
}

/// Successful token response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scopes (space-separated).
    pub scope: String,
}

impl TokenResponse {
    #[must_use]
    pub fn new(access_token: String, expires_in: u64, scope: String) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            id_token: None,
            refresh_token: None,
            scope,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, token: String) -> Self {
        self.refresh_token = Some(token);
        self
    }

    #[must_use]
    pub fn with_id_token(mut self, token: String) -> Self {
        self.id_token = Some(token);
        self
    }
}

/// JSON error body of the token endpoint.
///
/// ```json
/// { "error": "invalid_grant", "error_description": "authorization code is expired" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenErrorBody {
    pub error: String,

    pub error_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl From<&AuthError> for TokenErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            error: err.oauth_error_code().to_string(),
            error_description: err.description(),
            scope: err.scope().map(str::to_string),
        }
    }
}
