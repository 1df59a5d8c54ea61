//! # tessera-auth
//!
//! OAuth 2.0 / OpenID Connect authorization and token issuance engine.
//!
//! This crate provides:
//! - An ordered validation chain for authorization requests
//! - Interaction suspension and resumption (login, consent, custom prompts)
//! - Pluggable grant handlers behind a single token endpoint
//! - A typed token model persisted through storage adapters
//!
//! ## Modules
//!
//! - [`authorization`] - Authorization endpoint, validation chain and response delivery
//! - [`interaction`] - Sessions, interaction transactions and the resume flow
//! - [`grants`] - Token endpoint dispatcher and grant handlers
//! - [`token`] - Token model, persistence and ID token signing
//! - [`storage`] - Adapter, client registry and account traits with in-memory backends
//! - [`oauth`] - PKCE and client authentication
//! - [`cookies`] - Signed cookie helpers
//! - [`http`] - Axum handlers and router
//! - [`config`] - Provider configuration

pub mod authorization;
pub mod config;
pub mod cookies;
pub mod error;
pub mod grants;
pub mod http;
pub mod interaction;
pub mod oauth;
pub mod provider;
pub mod storage;
pub mod token;
pub mod types;

pub use authorization::{AuthorizationParams, EndpointResponse, ResponseBody, ValidationChain};
pub use config::{ConfigError, ProviderConfig, RefreshTokenRotation};
pub use error::{AuthError, AuthResult, ErrorCategory};
pub use grants::{GrantDispatcher, GrantHandler, TokenRequest, TokenResponse};
pub use interaction::{InteractionDetails, InteractionResult, LoginResult};
pub use provider::{Provider, ProviderBuilder};
pub use storage::{
    AccountProvider, Adapter, Adapters, ClientRegistry, MemoryAccountProvider, MemoryAdapter,
    MemoryClientRegistry,
};
pub use token::KeyStore;
pub use types::{Account, Client, GrantType, ResponseMode, ResponseType, Scope};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tessera_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::ProviderConfig;
    pub use crate::cookies::RequestCookies;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::http::router;
    pub use crate::interaction::{ConsentResult, InteractionResult, LoginResult};
    pub use crate::provider::Provider;
    pub use crate::storage::{MemoryAccountProvider, MemoryClientRegistry};
    pub use crate::token::KeyStore;
    pub use crate::types::{Account, Client, GrantType};
}
