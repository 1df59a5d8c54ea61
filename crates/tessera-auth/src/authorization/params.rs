//! Authorization request parameters.

use serde::{Deserialize, Serialize};

use crate::types::{ClaimsRequest, Scope};

/// Parameters of an authorization request, as received.
///
/// Empty values are treated as absent (see [`AuthorizationParams::normalized`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr_values: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_locales: Option<String>,
}

impl AuthorizationParams {
    /// Drops empty values so that `scope=` counts as missing.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for value in [
            &mut self.response_type,
            &mut self.client_id,
            &mut self.redirect_uri,
            &mut self.scope,
            &mut self.state,
            &mut self.nonce,
            &mut self.prompt,
            &mut self.response_mode,
            &mut self.max_age,
            &mut self.acr_values,
            &mut self.claims,
            &mut self.code_challenge,
            &mut self.code_challenge_method,
            &mut self.login_hint,
            &mut self.ui_locales,
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                *value = None;
            }
        }
        self
    }

    /// Looks a parameter up by its wire name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "response_type" => &self.response_type,
            "client_id" => &self.client_id,
            "redirect_uri" => &self.redirect_uri,
            "scope" => &self.scope,
            "state" => &self.state,
            "nonce" => &self.nonce,
            "prompt" => &self.prompt,
            "response_mode" => &self.response_mode,
            "max_age" => &self.max_age,
            "acr_values" => &self.acr_values,
            "claims" => &self.claims,
            "code_challenge" => &self.code_challenge,
            "code_challenge_method" => &self.code_challenge_method,
            "login_hint" => &self.login_hint,
            "ui_locales" => &self.ui_locales,
            _ => return None,
        };
        value.as_deref()
    }

    /// Names from `required` that are absent, in the given order.
    #[must_use]
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect()
    }

    #[must_use]
    pub fn has_prompt(&self, name: &str) -> bool {
        self.prompts().any(|p| p == name)
    }

    pub fn prompts(&self) -> impl Iterator<Item = &str> {
        self.prompt.as_deref().unwrap_or_default().split_whitespace()
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::parse(self.scope.as_deref().unwrap_or_default())
    }

    /// `max_age` in seconds; unparseable values are ignored.
    #[must_use]
    pub fn max_age_secs(&self) -> Option<i64> {
        self.max_age.as_deref().and_then(|v| v.parse().ok())
    }

    #[must_use]
    pub fn claims_request(&self) -> Option<ClaimsRequest> {
        self.claims.as_deref().and_then(ClaimsRequest::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_empty_values() {
        let params = AuthorizationParams {
            scope: Some(String::new()),
            state: Some("s".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(params.scope, None);
        assert_eq!(params.state.as_deref(), Some("s"));
    }

    #[test]
    fn test_missing_preserves_order() {
        let params = AuthorizationParams {
            client_id: Some("c".into()),
            ..Default::default()
        };
        assert_eq!(
            params.missing(&["response_type", "client_id", "scope"]),
            vec!["response_type", "scope"]
        );
    }

    #[test]
    fn test_prompts() {
        let params = AuthorizationParams {
            prompt: Some("login consent".into()),
            max_age: Some("300".into()),
            ..Default::default()
        };
        assert!(params.has_prompt("consent"));
        assert!(!params.has_prompt("none"));
        assert_eq!(params.max_age_secs(), Some(300));
    }

    #[test]
    fn test_deserialize_from_query() {
        let params: AuthorizationParams = serde_json::from_value(serde_json::json!({
            "response_type": "code",
            "client_id": "client",
            "unknown": "ignored"
        }))
        .unwrap();
        assert_eq!(params.get("response_type"), Some("code"));
        assert_eq!(params.get("unknown"), None);
    }
}
