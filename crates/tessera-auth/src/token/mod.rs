//! Token model.
//!
//! - [`model`]: persisted kinds (authorization code, access, refresh and
//!   client credentials tokens) built from composed field sets
//! - [`store`]: typed save / find / consume / destroy over an adapter
//! - [`id_token`]: ID token assembly and signing
//! - [`jwt`]: signing keys

pub mod id_token;
pub mod jwt;
pub mod model;
pub mod store;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

pub use id_token::{IdToken, IdTokenClaims, IdTokenSigning};
pub use jwt::{JwtError, KeyStore, SigningAlgorithm, SigningKeyPair};
pub use model::{
    AccessToken, AuthContext, AuthorizationCode, BaseToken, ClientCredentials, Consumable,
    RefreshToken, StoresAuth, Token,
};
pub use store::{FindOptions, TokenStore};

/// Generates an opaque token value: 256 random bits, base64url (43 chars).
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage key for a token value: hex encoded SHA-256.
#[must_use]
pub fn hash_token(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
