//! Relying party (client) registration types.
//!
//! A [`Client`] is read-only to the engine. Every redirect URI and response
//! type used by a request must be a member of the client's whitelist.

use serde::{Deserialize, Serialize};
use url::Url;

use super::ResponseType;

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types the token endpoint can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code exchange.
    AuthorizationCode,
    /// Refresh token exchange.
    RefreshToken,
    /// Machine-to-machine client credentials.
    ClientCredentials,
}

impl GrantType {
    /// Returns the wire value of the grant type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
            Self::ClientCredentials => "client_credentials",
        }
    }

    /// Parses a wire value. Returns `None` for unknown grant types.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "authorization_code" => Some(Self::AuthorizationCode),
            "refresh_token" => Some(Self::RefreshToken),
            "client_credentials" => Some(Self::ClientCredentials),
            _ => None,
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Subject Type and Auth Method
// =============================================================================

/// How the `sub` claim is derived for this client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// The account id is used verbatim.
    #[default]
    Public,
    /// A per-sector hash of the account id.
    Pairwise,
}

/// How the client authenticates at the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    /// Public client, `client_id` only.
    None,
    /// HTTP Basic with client_id:client_secret.
    #[default]
    ClientSecretBasic,
    /// client_id and client_secret in the request body.
    ClientSecretPost,
}

impl TokenEndpointAuthMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// A registered relying party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Whitelisted response types, each a space separated word set.
    #[serde(default = "default_response_types")]
    pub response_types: Vec<String>,

    #[serde(default = "default_grant_types")]
    pub grant_types: Vec<GrantType>,

    /// Scopes the client may request with the client_credentials grant.
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub default_acr_values: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_age: Option<u64>,

    #[serde(default)]
    pub subject_type: SubjectType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector_identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_signed_response_alg: Option<String>,

    #[serde(default)]
    pub token_endpoint_auth_method: TokenEndpointAuthMethod,
}

fn default_response_types() -> Vec<String> {
    vec!["code".to_string()]
}

fn default_grant_types() -> Vec<GrantType> {
    vec![GrantType::AuthorizationCode]
}

impl Client {
    /// Creates a client with the default whitelist (`code` /
    /// `authorization_code`) and no redirect URIs.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uris: Vec::new(),
            response_types: default_response_types(),
            grant_types: default_grant_types(),
            scopes: Vec::new(),
            default_acr_values: Vec::new(),
            default_max_age: None,
            subject_type: SubjectType::Public,
            sector_identifier: None,
            id_token_signed_response_alg: None,
            token_endpoint_auth_method: TokenEndpointAuthMethod::ClientSecretBasic,
        }
    }

    /// Validates the registration.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientValidationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.grant_types.is_empty() {
            return Err(ClientValidationError::NoGrantTypes);
        }

        if self.token_endpoint_auth_method != TokenEndpointAuthMethod::None
            && self.client_secret.is_none()
        {
            return Err(ClientValidationError::MissingSecret);
        }

        if self.grant_types.contains(&GrantType::AuthorizationCode) && self.redirect_uris.is_empty()
        {
            return Err(ClientValidationError::NoRedirectUris);
        }

        for uri in &self.redirect_uris {
            if Url::parse(uri).is_err() {
                return Err(ClientValidationError::InvalidRedirectUri(uri.clone()));
            }
        }

        for value in &self.response_types {
            if ResponseType::parse(value).is_none() {
                return Err(ClientValidationError::InvalidResponseType(value.clone()));
            }
        }

        if self.subject_type == SubjectType::Pairwise && self.sector_identifier().is_none() {
            return Err(ClientValidationError::MissingSectorIdentifier);
        }

        Ok(())
    }

    /// Exact-match whitelist check.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Whitelist check comparing response types as unordered word sets.
    #[must_use]
    pub fn is_response_type_allowed(&self, response_type: &ResponseType) -> bool {
        self.response_types
            .iter()
            .filter_map(|value| ResponseType::parse(value))
            .any(|allowed| &allowed == response_type)
    }

    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// Returns `true` if the client must present a secret at the token endpoint.
    #[must_use]
    pub fn is_confidential(&self) -> bool {
        self.token_endpoint_auth_method != TokenEndpointAuthMethod::None
    }

    /// Compares the presented secret with the registered one in constant time.
    #[must_use]
    pub fn verify_secret(&self, presented: &str) -> bool {
        let Some(expected) = self.client_secret.as_deref() else {
            return false;
        };
        let (a, b) = (expected.as_bytes(), presented.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }

    /// The sector used for pairwise subjects: the explicit sector identifier,
    /// else the host of the single registered redirect URI.
    #[must_use]
    pub fn sector_identifier(&self) -> Option<String> {
        if let Some(sector) = &self.sector_identifier {
            return Some(sector.clone());
        }
        let mut hosts = self
            .redirect_uris
            .iter()
            .filter_map(|uri| Url::parse(uri).ok())
            .filter_map(|url| url.host_str().map(str::to_string));
        let first = hosts.next()?;
        if hosts.all(|host| host == first) {
            Some(first)
        } else {
            None
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Client registration problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    #[error("client_id cannot be empty")]
    EmptyClientId,

    #[error("client must allow at least one grant type")]
    NoGrantTypes,

    #[error("confidential clients must have a client_secret")]
    MissingSecret,

    #[error("authorization_code clients must register at least one redirect_uri")]
    NoRedirectUris,

    #[error("invalid redirect_uri: {0}")]
    InvalidRedirectUri(String),

    #[error("invalid response_type: {0}")]
    InvalidResponseType(String),

    #[error("pairwise clients need a sector_identifier or redirect_uris on a single host")]
    MissingSectorIdentifier,
}
