//! ID token assembly and signing.
//!
//! ID tokens are never persisted. They are built from the account, the
//! authentication facts of the grant and the tokens issued alongside, then
//! signed for one client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use super::jwt::KeyStore;
use super::model::{AuthContext, StoresAuth};
use crate::AuthResult;
use crate::types::{Account, Client, Scope, SubjectType};

/// Claims of a signed ID token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,

    pub sub: String,

    pub aud: Vec<String>,

    pub exp: i64,

    pub iat: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amr: Option<Vec<String>>,

    /// Authorized party, present when there is more than one audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    /// Account claims released for the granted scope and claims request.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provider-level inputs to [`IdToken::sign`].
#[derive(Debug, Clone, Copy)]
pub struct IdTokenSigning<'a> {
    pub keys: &'a KeyStore,
    pub issuer: &'a str,
    pub ttl: std::time::Duration,
    pub pairwise_salt: &'a str,
}

/// An unsigned ID token.
#[derive(Debug, Clone)]
pub struct IdToken {
    account: Account,
    scope: Scope,
    auth: AuthContext,
    access_token: Option<String>,
    code: Option<String>,
}

impl IdToken {
    /// Starts an ID token for `account` carrying the facts in `auth`.
    ///
    /// Released claims follow `auth.scope` plus the names requested in
    /// `auth.claims.id_token`.
    #[must_use]
    pub fn new(account: Account, auth: AuthContext) -> Self {
        Self {
            scope: Scope::parse(auth.scope()),
            account,
            auth,
            access_token: None,
            code: None,
        }
    }

    /// Starts an ID token from the end-user facts stored on `token`.
    #[must_use]
    pub fn for_token<T: StoresAuth>(account: Account, token: &T) -> Self {
        Self::new(account, token.auth().clone())
    }

    /// Adds `at_hash` for an access token issued alongside.
    #[must_use]
    pub fn with_access_token(mut self, value: impl Into<String>) -> Self {
        self.access_token = Some(value.into());
        self
    }

    /// Adds `c_hash` for an authorization code issued alongside.
    #[must_use]
    pub fn with_code(mut self, value: impl Into<String>) -> Self {
        self.code = Some(value.into());
        self
    }

    /// Assembles the claims for `client` without signing them.
    ///
    /// # Errors
    ///
    /// Returns an error if no key matches the client's signing algorithm.
    pub fn claims(
        &self,
        client: &Client,
        audiences: &[String],
        signing: &IdTokenSigning<'_>,
    ) -> AuthResult<IdTokenClaims> {
        let key = signing
            .keys
            .key_for(client.id_token_signed_response_alg.as_deref())?;
        let iat = OffsetDateTime::now_utc().unix_timestamp();
        let ttl = i64::try_from(signing.ttl.as_secs()).unwrap_or(i64::MAX);

        let mut aud = vec![client.client_id.clone()];
        for extra in audiences {
            if !aud.contains(extra) {
                aud.push(extra.clone());
            }
        }
        let azp = (aud.len() > 1).then(|| client.client_id.clone());

        let requested = self
            .auth
            .claims
            .as_ref()
            .map(|c| c.id_token_claims())
            .unwrap_or_default();

        Ok(IdTokenClaims {
            iss: signing.issuer.to_string(),
            sub: subject(&self.account.account_id, client, signing.pairwise_salt),
            aud,
            exp: iat.saturating_add(ttl),
            iat,
            auth_time: self.auth.auth_time,
            nonce: self.auth.nonce.clone(),
            acr: self.auth.acr.clone(),
            amr: self.auth.amr.clone(),
            azp,
            at_hash: self
                .access_token
                .as_deref()
                .map(|v| key.algorithm.half_hash(v)),
            c_hash: self.code.as_deref().map(|v| key.algorithm.half_hash(v)),
            sid: self.auth.sid.clone(),
            extra: self.account.claims_for(&self.scope, &requested),
        })
    }

    /// Signs the ID token for `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no key matches the client's signing algorithm or
    /// signing fails.
    pub fn sign(
        &self,
        client: &Client,
        audiences: &[String],
        signing: &IdTokenSigning<'_>,
    ) -> AuthResult<String> {
        let claims = self.claims(client, audiences, signing)?;
        let key = signing
            .keys
            .key_for(client.id_token_signed_response_alg.as_deref())?;
        Ok(key.encode(&claims)?)
    }
}

/// The `sub` value for `account_id` as seen by `client`.
#[must_use]
pub fn subject(account_id: &str, client: &Client, salt: &str) -> String {
    match (client.subject_type, client.sector_identifier()) {
        (SubjectType::Pairwise, Some(sector)) => {
            let mut hasher = Sha256::new();
            hasher.update(sector.as_bytes());
            hasher.update(account_id.as_bytes());
            hasher.update(salt.as_bytes());
            hex::encode(hasher.finalize())
        }
        _ => account_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::jwt::{SigningAlgorithm, SigningKeyPair};
    use crate::types::ClaimsRequest;
    use std::time::Duration;

    fn keys() -> KeyStore {
        KeyStore::new(
            vec![SigningKeyPair::generate_ec().unwrap()],
            SigningAlgorithm::ES384,
        )
        .unwrap()
    }

    fn client() -> Client {
        let mut client = Client::new("client-1");
        client.redirect_uris = vec!["https://rp.example.com/cb".into()];
        client
    }

    fn account() -> Account {
        Account::new("user-1")
            .with_claim("email", "jane@example.com")
            .with_claim("name", "Jane")
    }

    fn auth(scope: &str) -> AuthContext {
        AuthContext {
            account_id: Some("user-1".into()),
            scope: Some(scope.into()),
            nonce: Some("nonce-1".into()),
            auth_time: Some(1_700_000_000),
            acr: Some("urn:acr:1".into()),
            amr: Some(vec!["pwd".into()]),
            sid: Some("sid-1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_claims_carry_auth_facts() {
        let keys = keys();
        let signing = IdTokenSigning {
            keys: &keys,
            issuer: "https://op.example.com",
            ttl: Duration::from_secs(3600),
            pairwise_salt: "",
        };
        let claims = IdToken::new(account(), auth("openid email"))
            .with_access_token("jHkWEdUXMU1BwAsC4vtUsZwnNvTIxEl0z9K3vx5KF0Y")
            .claims(&client(), &[], &signing)
            .unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.aud, vec!["client-1".to_string()]);
        assert_eq!(claims.azp, None);
        assert_eq!(claims.nonce.as_deref(), Some("nonce-1"));
        assert_eq!(claims.auth_time, Some(1_700_000_000));
        assert_eq!(claims.sid.as_deref(), Some("sid-1"));
        assert!(claims.at_hash.is_some());
        assert!(claims.c_hash.is_none());
        assert_eq!(claims.extra.get("email").unwrap(), "jane@example.com");
        assert!(!claims.extra.contains_key("name"));
    }

    #[test]
    fn test_for_token_takes_code_facts() {
        let keys = keys();
        let signing = IdTokenSigning {
            keys: &keys,
            issuer: "https://op.example.com",
            ttl: Duration::from_secs(3600),
            pairwise_salt: "",
        };
        let code = crate::token::AuthorizationCode::new(
            "client-1",
            Duration::from_secs(600),
            auth("openid"),
            "https://rp.example.com/cb",
        );
        let claims = IdToken::for_token(account(), &code)
            .with_code("SplxlOBeZQQYbYS6WxSbIA")
            .claims(&client(), &[], &signing)
            .unwrap();
        assert_eq!(claims.nonce.as_deref(), Some("nonce-1"));
        assert_eq!(claims.acr.as_deref(), Some("urn:acr:1"));
        assert!(claims.c_hash.is_some());
        assert!(!claims.extra.contains_key("email"));
    }

    #[test]
    fn test_claims_mask_releases_requested_claims() {
        let keys = keys();
        let signing = IdTokenSigning {
            keys: &keys,
            issuer: "https://op.example.com",
            ttl: Duration::from_secs(3600),
            pairwise_salt: "",
        };
        let mut auth = auth("openid");
        auth.claims = ClaimsRequest::parse(r#"{"id_token":{"name":null}}"#);
        let claims = IdToken::new(account(), auth)
            .claims(&client(), &[], &signing)
            .unwrap();
        assert_eq!(claims.extra.get("name").unwrap(), "Jane");
        assert!(!claims.extra.contains_key("email"));
    }

    #[test]
    fn test_extra_audiences_set_azp() {
        let keys = keys();
        let signing = IdTokenSigning {
            keys: &keys,
            issuer: "https://op.example.com",
            ttl: Duration::from_secs(3600),
            pairwise_salt: "",
        };
        let claims = IdToken::new(account(), auth("openid"))
            .claims(
                &client(),
                &["https://api.example.com".into(), "client-1".into()],
                &signing,
            )
            .unwrap();
        assert_eq!(claims.aud.len(), 2);
        assert_eq!(claims.azp.as_deref(), Some("client-1"));
    }

    #[test]
    fn test_pairwise_subject() {
        let mut c = client();
        c.subject_type = SubjectType::Pairwise;
        let a = subject("user-1", &c, "salt");
        assert_ne!(a, "user-1");
        assert_eq!(a, subject("user-1", &c, "salt"));
        assert_ne!(a, subject("user-2", &c, "salt"));

        let mut other = c.clone();
        other.redirect_uris = vec!["https://other.example.com/cb".into()];
        assert_ne!(a, subject("user-1", &other, "salt"));

        assert_eq!(subject("user-1", &client(), "salt"), "user-1");
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = keys();
        let signing = IdTokenSigning {
            keys: &keys,
            issuer: "https://op.example.com",
            ttl: Duration::from_secs(3600),
            pairwise_salt: "",
        };
        let jwt = IdToken::new(account(), auth("openid"))
            .with_code("code-value")
            .sign(&client(), &[], &signing)
            .unwrap();

        let decoded = keys
            .default_key()
            .unwrap()
            .decode::<IdTokenClaims>(&jwt, "https://op.example.com")
            .unwrap();
        assert_eq!(decoded.claims.sub, "user-1");
        assert_eq!(
            decoded.claims.c_hash,
            Some(SigningAlgorithm::ES384.half_hash("code-value"))
        );
    }

    #[test]
    fn test_unknown_client_algorithm_fails() {
        let keys = keys();
        let signing = IdTokenSigning {
            keys: &keys,
            issuer: "https://op.example.com",
            ttl: Duration::from_secs(3600),
            pairwise_salt: "",
        };
        let mut c = client();
        c.id_token_signed_response_alg = Some("RS256".into());
        assert!(
            IdToken::new(account(), auth("openid"))
                .sign(&c, &[], &signing)
                .is_err()
        );
    }
}
