//! Provider configuration.
//!
//! All engine behaviour that is not per-client is driven by a single
//! [`ProviderConfig`], constructed once and shared read-only behind an `Arc`.
//! Every section implements `Default`, so a configuration file only needs to
//! name the values it overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::ResponseType;

/// Top-level provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Issuer identifier placed in the `iss` claim of every ID token.
    pub issuer: String,

    /// Lifetimes of the issued artifacts.
    pub ttl: TtlConfig,

    /// Refresh token rotation policy.
    pub refresh_token_rotation: RefreshTokenRotation,

    /// Response types the provider supports, as space separated word sets.
    pub response_types: Vec<String>,

    /// Cookie names, signing keys and paths.
    pub cookies: CookieConfig,

    /// Interaction URL template. `{uid}` is replaced by the transaction id.
    pub interaction_url: String,

    /// ID token signing.
    pub signing: SigningConfig,

    /// Salt mixed into pairwise subject identifiers.
    pub pairwise_salt: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:3000".to_string(),
            ttl: TtlConfig::default(),
            refresh_token_rotation: RefreshTokenRotation::default(),
            response_types: vec![
                "code id_token token".to_string(),
                "code id_token".to_string(),
                "code token".to_string(),
                "code".to_string(),
                "id_token token".to_string(),
                "id_token".to_string(),
                "none".to_string(),
            ],
            cookies: CookieConfig::default(),
            interaction_url: "/auth/{uid}".to_string(),
            signing: SigningConfig::default(),
            pairwise_salt: String::new(),
        }
    }
}

impl ProviderConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty
    /// - No cookie signing key is configured
    /// - A supported response type contains an unknown word
    /// - The signing algorithm is not supported
    /// - The interaction URL does not contain `{uid}`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.cookies.keys.iter().all(String::is_empty) {
            return Err(ConfigError::InvalidValue(
                "at least one cookie signing key is required".to_string(),
            ));
        }

        for value in &self.response_types {
            if ResponseType::parse(value).is_none() {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid response type: '{value}'"
                )));
            }
        }

        match self.signing.algorithm.as_str() {
            "RS256" | "RS384" | "ES384" => {}
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{other}'. Must be RS256, RS384, or ES384"
                )));
            }
        }

        if !self.interaction_url.contains("{uid}") {
            return Err(ConfigError::InvalidValue(
                "interaction_url must contain the {uid} placeholder".to_string(),
            ));
        }

        if self.ttl.interaction.is_zero() {
            return Err(ConfigError::InvalidValue(
                "ttl.interaction must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns `true` if the provider supports the given response type.
    ///
    /// Response types compare as unordered word sets.
    #[must_use]
    pub fn supports_response_type(&self, response_type: &ResponseType) -> bool {
        self.response_types
            .iter()
            .filter_map(|value| ResponseType::parse(value))
            .any(|supported| &supported == response_type)
    }

    /// Builds the interaction URL for a transaction id.
    #[must_use]
    pub fn interaction_url_for(&self, uid: &str) -> String {
        self.interaction_url.replace("{uid}", uid)
    }
}

/// Artifact lifetimes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TtlConfig {
    #[serde(with = "humantime_serde")]
    pub authorization_code: Duration,

    #[serde(with = "humantime_serde")]
    pub access_token: Duration,

    #[serde(with = "humantime_serde")]
    pub client_credentials: Duration,

    #[serde(with = "humantime_serde")]
    pub id_token: Duration,

    #[serde(with = "humantime_serde")]
    pub refresh_token: Duration,

    /// Lifetime of a suspended interaction transaction.
    #[serde(with = "humantime_serde")]
    pub interaction: Duration,

    /// Lifetime of a remembered (persistent) session.
    #[serde(with = "humantime_serde")]
    pub session: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            authorization_code: Duration::from_secs(600),  // 10 minutes
            access_token: Duration::from_secs(3600),       // 1 hour
            client_credentials: Duration::from_secs(600),  // 10 minutes
            id_token: Duration::from_secs(3600),           // 1 hour
            refresh_token: Duration::from_secs(14 * 24 * 3600), // 14 days
            interaction: Duration::from_secs(3600),        // 1 hour
            session: Duration::from_secs(14 * 24 * 3600),  // 14 days
        }
    }
}

/// What happens to a refresh token when it is exchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenRotation {
    /// The same refresh token stays valid until it expires.
    None,
    /// The presented token is consumed and a replacement is issued.
    #[default]
    RotateAndConsume,
}

/// Cookie names and signing keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// HMAC key ring. The first key signs, every key verifies.
    pub keys: Vec<String>,

    pub session_name: String,

    pub interaction_name: String,

    /// Prefix of the per-client browser state cookie (`<prefix>.<client_id>`).
    pub state_name: String,

    /// Path the interaction cookie is scoped to; also the resume endpoint.
    pub resume_path: String,

    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            keys: vec!["tessera-development-cookie-key".to_string()],
            session_name: "_session".to_string(),
            interaction_name: "_grant".to_string(),
            state_name: "_state".to_string(),
            resume_path: "/auth/resume".to_string(),
            secure: false,
        }
    }
}

/// ID token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Default algorithm (RS256, RS384 or ES384).
    pub algorithm: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS256".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
