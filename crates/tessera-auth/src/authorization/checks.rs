//! The ordered validation chain for authorization requests.
//!
//! Each step inspects (and may amend) the [`AuthorizationContext`]; the first
//! failing step terminates the chain. The full chain runs on incoming
//! requests, a reduced chain runs again when a suspended request resumes.

use async_trait::async_trait;

use super::context::AuthorizationContext;
use crate::AuthResult;
use crate::config::ProviderConfig;
use crate::error::AuthError;
use crate::storage::ClientRegistry;
use crate::types::{ResponseMode, ResponseType};

/// Collaborators available to the checks.
#[derive(Clone, Copy)]
pub struct ChainEnv<'a> {
    pub config: &'a ProviderConfig,
    pub clients: &'a dyn ClientRegistry,
}

/// One step of the validation chain.
#[async_trait]
pub trait AuthorizationCheck: Send + Sync {
    /// Step name, used in logs.
    fn name(&self) -> &'static str;

    /// Runs the check.
    ///
    /// # Errors
    ///
    /// Returns the typed error that terminates the chain.
    async fn check(&self, ctx: &mut AuthorizationContext, env: &ChainEnv<'_>) -> AuthResult<()>;
}

/// `response_type`, `client_id` and `scope` must be present.
pub struct OAuthRequired;

#[async_trait]
impl AuthorizationCheck for OAuthRequired {
    fn name(&self) -> &'static str {
        "oauth_required"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, _env: &ChainEnv<'_>) -> AuthResult<()> {
        let missing = ctx.params.missing(&["response_type", "client_id", "scope"]);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthError::missing_parameters(&missing))
        }
    }
}

/// Resolves the client through the registry.
pub struct CheckClient;

#[async_trait]
impl AuthorizationCheck for CheckClient {
    fn name(&self) -> &'static str {
        "check_client"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, env: &ChainEnv<'_>) -> AuthResult<()> {
        let client_id = ctx.params.client_id.as_deref().unwrap_or_default();
        let client = env
            .clients
            .find(client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("unrecognized or unsupported client_id"))?;
        ctx.client = Some(client);
        Ok(())
    }
}

/// `redirect_uri` is mandatory, and so is `nonce` for front-channel tokens.
pub struct OidcRequired;

#[async_trait]
impl AuthorizationCheck for OidcRequired {
    fn name(&self) -> &'static str {
        "oidc_required"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, _env: &ChainEnv<'_>) -> AuthResult<()> {
        let mut required = vec!["redirect_uri"];
        let front_channel = ctx
            .params
            .response_type
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .any(|word| word == "token" || word == "id_token");
        if front_channel {
            required.push("nonce");
        }

        let missing = ctx.params.missing(&required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AuthError::missing_parameters(&missing))
        }
    }
}

/// The redirect URI must be whitelisted for the client.
pub struct CheckRedirectUri;

#[async_trait]
impl AuthorizationCheck for CheckRedirectUri {
    fn name(&self) -> &'static str {
        "check_redirect_uri"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, _env: &ChainEnv<'_>) -> AuthResult<()> {
        ctx.redirect_uri_checked = true;
        let client = ctx.client()?;
        let redirect_uri = ctx.params.redirect_uri.as_deref().unwrap_or_default();
        if client.is_redirect_uri_allowed(redirect_uri) {
            Ok(())
        } else {
            Err(AuthError::RedirectUriMismatch)
        }
    }
}

/// The response type must be supported by the provider and allowed for the
/// client.
pub struct CheckResponseType;

#[async_trait]
impl AuthorizationCheck for CheckResponseType {
    fn name(&self) -> &'static str {
        "check_response_type"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, env: &ChainEnv<'_>) -> AuthResult<()> {
        let raw = ctx.params.response_type.as_deref().unwrap_or_default();
        let response_type = ResponseType::parse(raw)
            .filter(|rt| env.config.supports_response_type(rt))
            .ok_or_else(|| AuthError::unsupported_response_type(raw))?;

        if !ctx.client()?.is_response_type_allowed(&response_type) {
            return Err(AuthError::restricted_response_type());
        }
        Ok(())
    }
}

/// The response mode must be known and usable with the response type.
pub struct CheckResponseMode;

#[async_trait]
impl AuthorizationCheck for CheckResponseMode {
    fn name(&self) -> &'static str {
        "check_response_mode"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, _env: &ChainEnv<'_>) -> AuthResult<()> {
        let Some(raw) = ctx.params.response_mode.as_deref() else {
            return Ok(());
        };
        let mode = ResponseMode::parse(raw)
            .ok_or_else(|| AuthError::invalid_request("unsupported response_mode requested"))?;

        if let Some(response_type) = ctx.response_type()
            && !mode.is_allowed_for(&response_type)
        {
            return Err(AuthError::invalid_request(
                "response_mode not allowed for this response_type",
            ));
        }
        Ok(())
    }
}

/// Fills `acr_values` and `max_age` from the client's defaults.
pub struct AssignDefaults;

#[async_trait]
impl AuthorizationCheck for AssignDefaults {
    fn name(&self) -> &'static str {
        "assign_defaults"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, _env: &ChainEnv<'_>) -> AuthResult<()> {
        let client = ctx.client()?;
        let acr_values = (!client.default_acr_values.is_empty())
            .then(|| client.default_acr_values.join(" "));
        let max_age = client.default_max_age.map(|v| v.to_string());

        if ctx.params.acr_values.is_none() {
            ctx.params.acr_values = acr_values;
        }
        if ctx.params.max_age.is_none() {
            ctx.params.max_age = max_age;
        }
        Ok(())
    }
}

/// `openid` must be among the requested scopes.
pub struct CheckOpenIdPresent;

#[async_trait]
impl AuthorizationCheck for CheckOpenIdPresent {
    fn name(&self) -> &'static str {
        "check_openid_present"
    }

    async fn check(&self, ctx: &mut AuthorizationContext, _env: &ChainEnv<'_>) -> AuthResult<()> {
        if ctx.params.scope().contains("openid") {
            Ok(())
        } else {
            Err(AuthError::invalid_request("openid is required scope"))
        }
    }
}

/// An ordered list of checks.
pub struct ValidationChain {
    steps: Vec<Box<dyn AuthorizationCheck>>,
}

impl ValidationChain {
    /// The chain applied to incoming authorization requests.
    #[must_use]
    pub fn authorization() -> Self {
        Self {
            steps: vec![
                Box::new(OAuthRequired),
                Box::new(CheckClient),
                Box::new(OidcRequired),
                Box::new(CheckRedirectUri),
                Box::new(CheckResponseType),
                Box::new(CheckResponseMode),
                Box::new(AssignDefaults),
                Box::new(CheckOpenIdPresent),
            ],
        }
    }

    /// The reduced chain applied when a suspended request resumes.
    #[must_use]
    pub fn resume() -> Self {
        Self {
            steps: vec![
                Box::new(OAuthRequired),
                Box::new(CheckClient),
                Box::new(CheckRedirectUri),
                Box::new(CheckOpenIdPresent),
            ],
        }
    }

    /// Step names, in execution order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|step| step.name())
    }

    /// Runs every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step.
    pub async fn run(&self, ctx: &mut AuthorizationContext, env: &ChainEnv<'_>) -> AuthResult<()> {
        for step in &self.steps {
            if let Err(err) = step.check(ctx, env).await {
                tracing::debug!(
                    step = step.name(),
                    client_id = ctx.params.client_id.as_deref().unwrap_or_default(),
                    error = err.oauth_error_code(),
                    "authorization check failed"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}
