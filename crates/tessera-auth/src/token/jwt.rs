//! JWT signing keys.
//!
//! ID tokens are signed with RS256, RS384 or ES384. A [`KeyStore`] holds one
//! key per algorithm and picks the key matching a client's
//! `id_token_signed_response_alg`, falling back to the provider default.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_auth::token::jwt::{KeyStore, SigningKeyPair, SigningAlgorithm};
//!
//! let keys = KeyStore::new(
//!     vec![SigningKeyPair::generate_rsa(SigningAlgorithm::RS256)?],
//!     SigningAlgorithm::RS256,
//! )?;
//! let jwt = keys.default_key().encode(&claims)?;
//! ```

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use p384::SecretKey as EcSecretKey;
use p384::ecdsa::SigningKey as EcSigningKey;
use p384::pkcs8::EncodePrivateKey as EcEncodePrivateKey;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256, Sha384};

use crate::error::AuthError;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// No key is available for the algorithm.
    #[error("No signing key for algorithm {alg}")]
    KeyNotFound {
        /// The requested algorithm.
        alg: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },
}

impl JwtError {
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::KeyNotFound { .. } => AuthError::configuration(err.to_string()),
            _ => AuthError::internal(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported ID token signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
    /// ECDSA with P-384 and SHA-384.
    ES384,
}

impl SigningAlgorithm {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RS256" => Some(Self::RS256),
            "RS384" => Some(Self::RS384),
            "ES384" => Some(Self::ES384),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }

    /// Computes an `at_hash` / `c_hash` value: the base64url encoded left
    /// half of the hash of `value`, using the algorithm's hash function.
    #[must_use]
    pub fn half_hash(&self, value: &str) -> String {
        let digest = match self {
            Self::RS256 => Sha256::digest(value.as_bytes()).to_vec(),
            Self::RS384 | Self::ES384 => Sha384::digest(value.as_bytes()).to_vec(),
        };
        URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// A signing key with its verification counterpart.
pub struct SigningKeyPair {
    /// Key ID placed in the JWT header.
    pub kid: String,

    pub algorithm: SigningAlgorithm,

    encoding_key: EncodingKey,

    decoding_key: DecodingKey,
}

impl SigningKeyPair {
    /// Generates a 2048-bit RSA key for RS256 or RS384.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not RSA based or generation fails.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::key_generation_error(format!(
                "Algorithm {algorithm} is not RSA-based"
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm,
            encoding_key,
            decoding_key,
        })
    }

    /// Generates a P-384 key for ES384.
    ///
    /// # Errors
    ///
    /// Returns an error if key export fails.
    pub fn generate_ec() -> Result<Self, JwtError> {
        let secret_key = EcSecretKey::random(&mut OsRng);
        let point = EcSigningKey::from(&secret_key)
            .verifying_key()
            .to_encoded_point(false);
        let x = point
            .x()
            .ok_or_else(|| JwtError::key_generation_error("Missing x coordinate"))?;
        let y = point
            .y()
            .ok_or_else(|| JwtError::key_generation_error("Missing y coordinate"))?;

        let private_pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let decoding_key = DecodingKey::from_ec_components(
            &URL_SAFE_NO_PAD.encode(x.as_slice()),
            &URL_SAFE_NO_PAD.encode(y.as_slice()),
        )
        .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm: SigningAlgorithm::ES384,
            encoding_key,
            decoding_key,
        })
    }

    /// Generates a key for any supported algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        match algorithm {
            SigningAlgorithm::ES384 => Self::generate_ec(),
            rsa => Self::generate_rsa(rsa),
        }
    }

    /// Signs `claims` into a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if serialization or signing fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(self.algorithm.to_jwt_algorithm());
        header.kid = Some(self.kid.clone());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Verifies a JWT signed by this key, checking `iss` and `exp`.
    ///
    /// Audience checks are left to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature, issuer or expiry is invalid.
    pub fn decode<T: DeserializeOwned>(
        &self,
        token: &str,
        issuer: &str,
    ) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(self.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;

        decode(token, &self.decoding_key, &validation).map_err(JwtError::from)
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Key Store
// ============================================================================

/// Signing keys indexed by algorithm.
#[derive(Debug)]
pub struct KeyStore {
    keys: Vec<SigningKeyPair>,
    default_algorithm: SigningAlgorithm,
}

impl KeyStore {
    /// # Errors
    ///
    /// Returns `JwtError::KeyNotFound` if no key matches the default algorithm.
    pub fn new(
        keys: Vec<SigningKeyPair>,
        default_algorithm: SigningAlgorithm,
    ) -> Result<Self, JwtError> {
        if !keys.iter().any(|k| k.algorithm == default_algorithm) {
            return Err(JwtError::KeyNotFound {
                alg: default_algorithm.to_string(),
            });
        }
        Ok(Self {
            keys,
            default_algorithm,
        })
    }

    /// Generates one key per listed algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be generated or the default is not listed.
    pub fn generate(
        algorithms: &[SigningAlgorithm],
        default_algorithm: SigningAlgorithm,
    ) -> Result<Self, JwtError> {
        let keys = algorithms
            .iter()
            .map(|alg| SigningKeyPair::generate(*alg))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(keys, default_algorithm)
    }

    /// Returns the key for `algorithm`, or the default key when `None`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::KeyNotFound` for unknown or unavailable algorithms.
    pub fn key_for(&self, algorithm: Option<&str>) -> Result<&SigningKeyPair, JwtError> {
        let wanted = match algorithm {
            Some(name) => SigningAlgorithm::parse(name)
                .ok_or_else(|| JwtError::KeyNotFound { alg: name.to_string() })?,
            None => self.default_algorithm,
        };
        self.keys
            .iter()
            .find(|k| k.algorithm == wanted)
            .ok_or_else(|| JwtError::KeyNotFound {
                alg: wanted.to_string(),
            })
    }

    /// The key for the default algorithm.
    ///
    /// # Errors
    ///
    /// Never fails for a store built through [`KeyStore::new`].
    pub fn default_key(&self) -> Result<&SigningKeyPair, JwtError> {
        self.key_for(None)
    }
}

// ============================================================================
// Tests
// ============================================================================
