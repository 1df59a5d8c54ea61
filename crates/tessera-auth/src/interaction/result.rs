//! Interaction results submitted by the interaction UI.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::prompt::Prompt;

/// End-user authentication outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    /// Authenticated account id.
    pub account: String,

    /// Authentication time (unix seconds); the resume time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,

    /// Persist the session beyond the browser session.
    #[serde(default)]
    pub remember: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,
}

/// End-user consent outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentResult {
    /// Granted scope, replacing the requested one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Everything an interaction may report back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent: Option<ConsentResult>,

    /// Arbitrary data stored in the session for the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,

    /// Aborts the request with this error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// Custom prompt results, keyed by prompt name.
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl InteractionResult {
    /// A login-only result.
    #[must_use]
    pub fn login(account: impl Into<String>) -> Self {
        Self {
            login: Some(LoginResult {
                account: account.into(),
                ts: None,
                remember: false,
                acr: None,
                amr: None,
            }),
            ..Default::default()
        }
    }

    /// An aborting result.
    #[must_use]
    pub fn error(error: impl Into<String>, description: Option<String>) -> Self {
        Self {
            error: Some(error.into()),
            error_description: description,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_consent(mut self, scope: Option<String>) -> Self {
        self.consent = Some(ConsentResult { scope });
        self
    }

    #[must_use]
    pub fn remember(mut self) -> Self {
        if let Some(login) = self.login.as_mut() {
            login.remember = true;
        }
        self
    }

    /// `true` if the result carries the sub-record for `prompt`.
    #[must_use]
    pub fn resolves(&self, prompt: &Prompt) -> bool {
        match prompt {
            Prompt::Login => self.login.is_some(),
            Prompt::Consent => self.consent.is_some(),
            Prompt::Custom(name) => self.custom.contains_key(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_with_custom_prompt() {
        let result: InteractionResult = serde_json::from_value(json!({
            "login": { "account": "alice", "remember": true },
            "select_account": { "chosen": true }
        }))
        .unwrap();
        assert_eq!(result.login.as_ref().unwrap().account, "alice");
        assert!(result.login.as_ref().unwrap().remember);
        assert!(result.resolves(&Prompt::Login));
        assert!(!result.resolves(&Prompt::Consent));
        assert!(result.resolves(&Prompt::Custom("select_account".into())));
    }

    #[test]
    fn test_builders() {
        let result = InteractionResult::login("alice")
            .remember()
            .with_consent(Some("openid".into()));
        assert!(result.resolves(&Prompt::Consent));
        assert!(result.login.unwrap().remember);

        let aborted = InteractionResult::error("access_denied", None);
        assert_eq!(aborted.error.as_deref(), Some("access_denied"));
    }
}
