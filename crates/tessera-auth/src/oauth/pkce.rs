//! Proof Key for Code Exchange (RFC 7636), S256 method only.
//!
//! The challenge is bound to the authorization code at issuance and checked
//! against the verifier presented at the token endpoint.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// PKCE failures.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    #[error("code_verifier must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    #[error("code_verifier contains characters outside [A-Za-z0-9-._~]")]
    InvalidVerifierCharacters,

    #[error("code_challenge must be base64url encoded")]
    InvalidChallengeFormat,

    #[error("unsupported code_challenge_method ({0}), only S256 is allowed")]
    UnsupportedMethod(String),

    #[error("PKCE verification failed")]
    VerificationFailed,
}

impl From<PkceError> for AuthError {
    fn from(err: PkceError) -> Self {
        match err {
            PkceError::VerificationFailed => AuthError::invalid_grant(err.to_string()),
            _ => AuthError::invalid_request(err.to_string()),
        }
    }
}

/// Supported challenge methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PkceChallengeMethod {
    #[default]
    S256,
}

impl PkceChallengeMethod {
    /// Parses the `code_challenge_method` parameter. An absent value means S256.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for `plain` and unknown methods.
    pub fn parse(method: Option<&str>) -> Result<Self, PkceError> {
        match method {
            None | Some("S256") => Ok(Self::S256),
            Some(other) => Err(PkceError::UnsupportedMethod(other.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        "S256"
    }
}

/// A validated code verifier.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// # Errors
    ///
    /// Returns an error if the verifier has the wrong length or characters.
    pub fn new(verifier: impl Into<String>) -> Result<Self, PkceError> {
        let verifier = verifier.into();
        let len = verifier.len();
        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }
        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }
        Ok(Self(verifier))
    }

    /// Generates a random verifier (used by tests and demo clients).
    #[must_use]
    pub fn generate() -> Self {
        Self(crate::token::generate_token())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A code challenge as sent in the authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// # Errors
    ///
    /// Returns `PkceError::InvalidChallengeFormat` if the value is not base64url.
    pub fn new(challenge: impl Into<String>) -> Result<Self, PkceError> {
        let challenge = challenge.into();
        if URL_SAFE_NO_PAD.decode(&challenge).is_err() {
            return Err(PkceError::InvalidChallengeFormat);
        }
        Ok(Self(challenge))
    }

    #[must_use]
    pub fn from_verifier(verifier: &PkceVerifier) -> Self {
        Self(URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.0.as_bytes())))
    }

    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` if the verifier does not match.
    pub fn verify(&self, verifier: &PkceVerifier) -> Result<(), PkceError> {
        if Self::from_verifier(verifier) == *self {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
