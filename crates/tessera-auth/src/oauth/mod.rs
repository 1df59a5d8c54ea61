//! OAuth 2.0 protocol helpers.

pub mod client_auth;
pub mod pkce;

pub use client_auth::{PresentedCredentials, authenticate_client, parse_basic_auth};
pub use pkce::{PkceChallenge, PkceChallengeMethod, PkceError, PkceVerifier};
