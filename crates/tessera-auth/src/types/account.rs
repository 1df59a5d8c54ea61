//! End-user accounts and the claims they release.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Scope;

/// Claims released by each standard scope value.
const SCOPE_CLAIMS: &[(&str, &[&str])] = &[
    (
        "profile",
        &[
            "name",
            "family_name",
            "given_name",
            "middle_name",
            "nickname",
            "preferred_username",
            "profile",
            "picture",
            "website",
            "gender",
            "birthdate",
            "zoneinfo",
            "locale",
            "updated_at",
        ],
    ),
    ("email", &["email", "email_verified"]),
    ("address", &["address"]),
    ("phone", &["phone_number", "phone_number_verified"]),
];

/// An end-user account as returned by the account provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,

    /// Every claim the account can release, keyed by claim name.
    #[serde(default)]
    pub claims: Map<String, Value>,
}

impl Account {
    #[must_use]
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            claims: Map::new(),
        }
    }

    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Selects the claims released for the granted scope plus the claims
    /// explicitly requested by name. `sub` is never included here.
    #[must_use]
    pub fn claims_for(&self, scope: &Scope, requested: &[String]) -> Map<String, Value> {
        self.claims
            .iter()
            .filter(|(name, _)| name.as_str() != "sub")
            .filter(|(name, _)| {
                requested.iter().any(|r| r == *name)
                    || SCOPE_CLAIMS.iter().any(|(value, claims)| {
                        scope.contains(value) && claims.contains(&name.as_str())
                    })
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// The `claims` authorization request parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo: Option<Map<String, Value>>,
}

impl ClaimsRequest {
    /// Parses the JSON encoded parameter. Returns `None` when it is malformed.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_str(value).ok()
    }

    /// Claim names requested for the ID token.
    #[must_use]
    pub fn id_token_claims(&self) -> Vec<String> {
        self.id_token
            .as_ref()
            .map(|claims| claims.keys().cloned().collect())
            .unwrap_or_default()
    }
}
