//! Prompts: end-user interactions a request may require.

use std::fmt;

use super::session::Session;
use crate::authorization::AuthorizationParams;
use crate::error::AuthError;

/// A prompt that must be resolved before issuance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Prompt {
    Login,
    Consent,
    /// Any other `prompt` value except `none`.
    Custom(String),
}

impl Prompt {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "login" => Self::Login,
            "consent" => Self::Consent,
            other => Self::Custom(other.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Login => "login",
            Self::Consent => "consent",
            Self::Custom(name) => name,
        }
    }

    /// The `<prompt>_required` error for this prompt.
    #[must_use]
    pub fn required_error(&self, message: impl Into<String>) -> AuthError {
        match self {
            Self::Login => AuthError::login_required(message),
            Self::Consent => AuthError::consent_required(message),
            Self::Custom(_) => AuthError::interaction_required(message),
        }
    }

    /// Error for a resumed interaction that did not resolve this prompt.
    #[must_use]
    pub fn unresolved_error(&self) -> AuthError {
        self.required_error(format!("prompt {} was not resolved", self.name()))
    }

    /// Error for a `prompt=none` request that would need this prompt.
    #[must_use]
    pub fn none_error(&self) -> AuthError {
        match self {
            Self::Login => AuthError::login_required("End-User authentication is required"),
            Self::Consent => AuthError::consent_required("End-User consent is required"),
            Self::Custom(name) => {
                AuthError::interaction_required(format!("prompt {name} requires interaction"))
            }
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Prompts `params` require given the current `session`, login first.
#[must_use]
pub fn required_prompts(params: &AuthorizationParams, session: &Session, now: i64) -> Vec<Prompt> {
    let login_required = session.account_id.is_none()
        || params.has_prompt("login")
        || params
            .max_age_secs()
            .is_some_and(|max_age| session.past_max_age(max_age, now));

    let mut prompts = Vec::new();
    if login_required {
        prompts.push(Prompt::Login);
    }
    for name in params.prompts() {
        let prompt = match name {
            "none" | "login" => continue,
            other => Prompt::parse(other),
        };
        if !prompts.contains(&prompt) {
            prompts.push(prompt);
        }
    }
    prompts
}
